//! Frame graph definition and compilation

use crate::frame_graph::pass::*;
use crate::frame_graph::resource::*;
use std::collections::{BTreeSet, HashSet};
use thiserror::Error;

/// Frame graph error type
#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Pass '{0}' is already registered")]
    DuplicatePass(String),
    #[error("Resource '{0}' is already registered")]
    DuplicateResource(String),
    #[error("Dependency cycle among passes: {}", .passes.join(", "))]
    Cycle { passes: Vec<String> },
}

/// The main frame graph structure.
///
/// Passes and resources are registered against a mutable builder;
/// [`FrameGraph::compile`] produces an immutable execution plan. Any
/// registration change after compiling invalidates earlier plans.
pub struct FrameGraph {
    passes: Vec<Box<dyn RenderPass>>,
    pass_nodes: Vec<PassNode>,
    resources: Vec<ResourceDesc>,
    revision: u64,
}

impl FrameGraph {
    pub fn new() -> Self {
        Self {
            passes: Vec::new(),
            pass_nodes: Vec::new(),
            resources: Vec::new(),
            revision: 0,
        }
    }

    /// Add a render pass to the graph.
    ///
    /// The pass's `setup` runs immediately to record its resource accesses
    /// and priority. Fails if a pass with the same name is already present.
    pub fn add_pass<P: RenderPass + 'static>(
        &mut self,
        pass: P,
        screen_width: u32,
        screen_height: u32,
    ) -> Result<(), GraphError> {
        let name = pass.name().to_string();
        if self.pass_nodes.iter().any(|n| n.name == name) {
            return Err(GraphError::DuplicatePass(name));
        }

        let mut boxed_pass = Box::new(pass);
        let mut inputs = Vec::new();
        let mut outputs = Vec::new();
        let mut priority = 0;
        {
            let mut ctx = PassSetupContext {
                inputs: &mut inputs,
                outputs: &mut outputs,
                priority: &mut priority,
                screen_width,
                screen_height,
            };
            boxed_pass.setup(&mut ctx);
        }

        self.passes.push(boxed_pass);
        self.pass_nodes.push(PassNode {
            name,
            priority,
            inputs,
            outputs,
        });
        self.revision += 1;
        Ok(())
    }

    /// Remove a pass by name. Returns whether a pass was removed.
    pub fn remove_pass(&mut self, name: &str) -> bool {
        if let Some(index) = self.pass_nodes.iter().position(|n| n.name == name) {
            self.pass_nodes.remove(index);
            self.passes.remove(index);
            self.revision += 1;
            true
        } else {
            false
        }
    }

    /// Register a resource definition.
    ///
    /// Passes may reference a resource before or after it is registered;
    /// references that never resolve compile with a warning.
    pub fn add_resource(&mut self, desc: ResourceDesc) -> Result<(), GraphError> {
        if self.resources.iter().any(|r| r.name == desc.name) {
            return Err(GraphError::DuplicateResource(desc.name));
        }
        self.resources.push(desc);
        self.revision += 1;
        Ok(())
    }

    /// Remove a resource definition by name. Returns whether one was removed.
    pub fn remove_resource(&mut self, name: &str) -> bool {
        if let Some(index) = self.resources.iter().position(|r| r.name == name) {
            self.resources.remove(index);
            self.revision += 1;
            true
        } else {
            false
        }
    }

    /// Look up a resource definition by name.
    pub fn get_resource(&self, name: &str) -> Option<&ResourceDesc> {
        self.resources.iter().find(|r| r.name == name)
    }

    /// Get pass nodes (metadata)
    pub fn pass_nodes(&self) -> &[PassNode] {
        &self.pass_nodes
    }

    /// Get all resource definitions
    pub fn resources(&self) -> &[ResourceDesc] {
        &self.resources
    }

    /// Whether a compiled graph still matches the current registrations.
    pub fn is_current(&self, compiled: &CompiledGraph) -> bool {
        compiled.revision == self.revision
    }

    pub(crate) fn pass_mut(&mut self, name: &str) -> Option<&mut dyn RenderPass> {
        let index = self.pass_nodes.iter().position(|n| n.name == name)?;
        Some(self.passes[index].as_mut())
    }

    fn is_defined(&self, resource: &str) -> bool {
        self.resources.iter().any(|r| r.name == resource)
    }

    /// Compile the graph into an execution plan.
    ///
    /// Builds a dependency edge P→Q for every pass P writing a defined
    /// resource that pass Q reads, then runs a Kahn topological sort where
    /// the ready set is ordered by `(priority, registration order)`. Fails
    /// only on a dependency cycle; undefined resource references are
    /// collected as warnings and their edges omitted.
    pub fn compile(&self) -> Result<CompiledGraph, GraphError> {
        let pass_count = self.pass_nodes.len();
        let mut warnings = Vec::new();

        // Undefined-reference warnings. The affected edges are simply not
        // created below because edges only form over defined resources.
        for node in &self.pass_nodes {
            for access in &node.inputs {
                if access.is_read() && !self.is_defined(&access.resource) {
                    warnings.push(format!(
                        "Pass '{}' reads from undefined resource '{}'",
                        node.name, access.resource
                    ));
                }
            }
            for access in &node.outputs {
                if access.is_write() && !self.is_defined(&access.resource) {
                    warnings.push(format!(
                        "Pass '{}' writes to undefined resource '{}'",
                        node.name, access.resource
                    ));
                }
            }
        }

        // Single-writer check: two writers to one resource have no relative
        // order, so the plan would be ambiguous.
        for resource in &self.resources {
            let writers: Vec<&str> = self
                .pass_nodes
                .iter()
                .filter(|n| n.writes_resource(&resource.name))
                .map(|n| n.name.as_str())
                .collect();
            if writers.len() > 1 {
                warnings.push(format!(
                    "Resource '{}' is written by more than one pass: {}",
                    resource.name,
                    writers.join(", ")
                ));
            }
        }

        // A pass depends on another if it reads a resource the other writes
        let mut edges: HashSet<(usize, usize)> = HashSet::new();
        for (writer_index, writer) in self.pass_nodes.iter().enumerate() {
            for (reader_index, reader) in self.pass_nodes.iter().enumerate() {
                if writer_index == reader_index {
                    continue;
                }
                for input in &reader.inputs {
                    if input.is_read()
                        && self.is_defined(&input.resource)
                        && writer.writes_resource(&input.resource)
                    {
                        edges.insert((writer_index, reader_index));
                    }
                }
            }
        }

        let mut successors: Vec<Vec<usize>> = vec![Vec::new(); pass_count];
        let mut in_degree: Vec<usize> = vec![0; pass_count];
        for &(from, to) in &edges {
            successors[from].push(to);
            in_degree[to] += 1;
        }

        // Kahn's algorithm. Among ready passes, lowest priority first,
        // registration order breaking ties.
        let mut ready: BTreeSet<(i32, usize)> = (0..pass_count)
            .filter(|&i| in_degree[i] == 0)
            .map(|i| (self.pass_nodes[i].priority, i))
            .collect();

        let mut pass_order = Vec::with_capacity(pass_count);
        while let Some((_, index)) = ready.pop_first() {
            pass_order.push(self.pass_nodes[index].name.clone());

            for &succ in &successors[index] {
                in_degree[succ] -= 1;
                if in_degree[succ] == 0 {
                    ready.insert((self.pass_nodes[succ].priority, succ));
                }
            }
        }

        if pass_order.len() < pass_count {
            let emitted: HashSet<&str> = pass_order.iter().map(String::as_str).collect();
            let passes = self
                .pass_nodes
                .iter()
                .filter(|n| !emitted.contains(n.name.as_str()))
                .map(|n| n.name.clone())
                .collect();
            return Err(GraphError::Cycle { passes });
        }

        // Resources a single pass both reads and writes must ping-pong
        // between two physical buffers.
        let mut ping_pong = BTreeSet::new();
        for node in &self.pass_nodes {
            for access in &node.outputs {
                if access.mode == AccessMode::ReadWrite {
                    ping_pong.insert(access.resource.clone());
                }
            }
        }

        // First-write order over defined resources, for lazy allocation
        // interleaved with execution.
        let mut allocation_order = Vec::new();
        let mut allocated: HashSet<&str> = HashSet::new();
        for name in &pass_order {
            let node = self
                .pass_nodes
                .iter()
                .find(|n| &n.name == name)
                .expect("emitted pass has a node");
            for access in &node.outputs {
                if access.is_write()
                    && self.is_defined(&access.resource)
                    && allocated.insert(access.resource.as_str())
                {
                    allocation_order.push(access.resource.clone());
                }
            }
        }

        Ok(CompiledGraph {
            pass_order,
            ping_pong,
            allocation_order,
            warnings,
            revision: self.revision,
        })
    }
}

impl Default for FrameGraph {
    fn default() -> Self {
        Self::new()
    }
}

/// Compiled frame graph: an immutable execution plan.
#[derive(Debug)]
pub struct CompiledGraph {
    /// Pass names in execution order. Every registered pass appears once;
    /// every writer precedes its readers.
    pub pass_order: Vec<String>,
    /// Resources requiring double-buffering by the caller.
    pub ping_pong: BTreeSet<String>,
    /// Defined resources in first-write order.
    pub allocation_order: Vec<String>,
    /// Non-fatal validation findings.
    pub warnings: Vec<String>,
    pub(crate) revision: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Declarative test pass: name, priority, reads, writes, readwrites.
    struct TestPass {
        name: &'static str,
        priority: i32,
        reads: Vec<&'static str>,
        writes: Vec<&'static str>,
        read_writes: Vec<&'static str>,
        executed: std::rc::Rc<std::cell::RefCell<Vec<String>>>,
    }

    impl TestPass {
        fn new(name: &'static str) -> Self {
            Self {
                name,
                priority: 0,
                reads: Vec::new(),
                writes: Vec::new(),
                read_writes: Vec::new(),
                executed: Default::default(),
            }
        }

        fn priority(mut self, priority: i32) -> Self {
            self.priority = priority;
            self
        }

        fn reads(mut self, resource: &'static str) -> Self {
            self.reads.push(resource);
            self
        }

        fn writes(mut self, resource: &'static str) -> Self {
            self.writes.push(resource);
            self
        }

        fn read_writes(mut self, resource: &'static str) -> Self {
            self.read_writes.push(resource);
            self
        }
    }

    impl RenderPass for TestPass {
        fn name(&self) -> &str {
            self.name
        }

        fn setup(&mut self, ctx: &mut PassSetupContext) {
            ctx.set_priority(self.priority);
            for r in &self.reads {
                ctx.read(*r);
            }
            for w in &self.writes {
                ctx.write(*w);
            }
            for rw in &self.read_writes {
                ctx.read_write(*rw);
            }
        }

        fn execute(&mut self, _ctx: &mut PassExecuteContext) {
            self.executed.borrow_mut().push(self.name.to_string());
        }
    }

    fn graph_with_resources(names: &[&str]) -> FrameGraph {
        let mut graph = FrameGraph::new();
        for name in names {
            graph
                .add_resource(ResourceDesc::new(
                    *name,
                    ResourceKind::Texture,
                    ResourceSize::default(),
                ))
                .unwrap();
        }
        graph
    }

    fn position(order: &[String], name: &str) -> usize {
        order.iter().position(|n| n == name).unwrap()
    }

    #[test]
    fn writer_precedes_reader() {
        let mut graph = graph_with_resources(&["a"]);
        graph
            .add_pass(TestPass::new("consume").reads("a"), 64, 64)
            .unwrap();
        graph
            .add_pass(TestPass::new("produce").writes("a"), 64, 64)
            .unwrap();

        let compiled = graph.compile().unwrap();
        assert!(
            position(&compiled.pass_order, "produce") < position(&compiled.pass_order, "consume")
        );
    }

    #[test]
    fn independent_passes_order_by_priority() {
        let mut graph = FrameGraph::new();
        graph
            .add_pass(TestPass::new("late").priority(5), 64, 64)
            .unwrap();
        graph
            .add_pass(TestPass::new("early").priority(-1), 64, 64)
            .unwrap();
        graph
            .add_pass(TestPass::new("middle").priority(2), 64, 64)
            .unwrap();

        let compiled = graph.compile().unwrap();
        assert_eq!(compiled.pass_order, vec!["early", "middle", "late"]);
    }

    #[test]
    fn equal_priority_preserves_registration_order() {
        let mut graph = FrameGraph::new();
        for name in ["first", "second", "third"] {
            graph.add_pass(TestPass::new(name), 64, 64).unwrap();
        }

        let compiled = graph.compile().unwrap();
        assert_eq!(compiled.pass_order, vec!["first", "second", "third"]);
    }

    #[test]
    fn cycle_fails_naming_involved_passes() {
        let mut graph = graph_with_resources(&["a", "b", "c"]);
        graph
            .add_pass(TestPass::new("A").writes("a").reads("c"), 64, 64)
            .unwrap();
        graph
            .add_pass(TestPass::new("B").writes("b").reads("a"), 64, 64)
            .unwrap();
        graph
            .add_pass(TestPass::new("C").writes("c").reads("b"), 64, 64)
            .unwrap();

        match graph.compile() {
            Err(GraphError::Cycle { passes }) => {
                assert!(!passes.is_empty());
                for name in &passes {
                    assert!(["A", "B", "C"].contains(&name.as_str()));
                }
            }
            other => panic!("expected cycle error, got {other:?}"),
        }
    }

    #[test]
    fn diamond_places_source_first_and_sink_last() {
        let mut graph = graph_with_resources(&["a", "b", "c"]);
        graph
            .add_pass(TestPass::new("A").writes("a"), 64, 64)
            .unwrap();
        graph
            .add_pass(TestPass::new("B").reads("a").writes("b"), 64, 64)
            .unwrap();
        graph
            .add_pass(TestPass::new("C").reads("a").writes("c"), 64, 64)
            .unwrap();
        graph
            .add_pass(TestPass::new("D").reads("b").reads("c"), 64, 64)
            .unwrap();

        let compiled = graph.compile().unwrap();
        let order = &compiled.pass_order;
        assert_eq!(order.len(), 4);
        assert_eq!(order.first().unwrap(), "A");
        assert_eq!(order.last().unwrap(), "D");
    }

    #[test]
    fn readwrite_access_joins_ping_pong_set() {
        let mut graph = graph_with_resources(&["buf", "plain"]);
        graph
            .add_pass(
                TestPass::new("accumulate").read_writes("buf").writes("plain"),
                64,
                64,
            )
            .unwrap();

        let compiled = graph.compile().unwrap();
        assert!(compiled.ping_pong.contains("buf"));
        assert!(!compiled.ping_pong.contains("plain"));
    }

    #[test]
    fn undefined_resource_warns_without_failing() {
        let mut graph = FrameGraph::new();
        graph
            .add_pass(TestPass::new("lonely").reads("ghost").writes("phantom"), 64, 64)
            .unwrap();

        let compiled = graph.compile().unwrap();
        assert!(compiled
            .warnings
            .contains(&"Pass 'lonely' reads from undefined resource 'ghost'".to_string()));
        assert!(compiled
            .warnings
            .contains(&"Pass 'lonely' writes to undefined resource 'phantom'".to_string()));
        assert_eq!(compiled.pass_order, vec!["lonely"]);
    }

    #[test]
    fn multiple_writers_warn() {
        let mut graph = graph_with_resources(&["shared"]);
        graph
            .add_pass(TestPass::new("one").writes("shared"), 64, 64)
            .unwrap();
        graph
            .add_pass(TestPass::new("two").writes("shared"), 64, 64)
            .unwrap();

        let compiled = graph.compile().unwrap();
        assert!(compiled
            .warnings
            .iter()
            .any(|w| w.contains("'shared'") && w.contains("more than one pass")));
    }

    #[test]
    fn allocation_order_follows_first_write() {
        let mut graph = graph_with_resources(&["a", "b"]);
        graph
            .add_pass(TestPass::new("second").reads("a").writes("b"), 64, 64)
            .unwrap();
        graph
            .add_pass(TestPass::new("first").writes("a"), 64, 64)
            .unwrap();

        let compiled = graph.compile().unwrap();
        assert_eq!(compiled.allocation_order, vec!["a", "b"]);
    }

    #[test]
    fn duplicate_pass_is_rejected() {
        let mut graph = FrameGraph::new();
        graph.add_pass(TestPass::new("dup"), 64, 64).unwrap();
        assert!(matches!(
            graph.add_pass(TestPass::new("dup"), 64, 64),
            Err(GraphError::DuplicatePass(name)) if name == "dup"
        ));
    }

    #[test]
    fn mutation_invalidates_compiled_graph() {
        let mut graph = graph_with_resources(&["a"]);
        graph
            .add_pass(TestPass::new("only").writes("a"), 64, 64)
            .unwrap();

        let compiled = graph.compile().unwrap();
        assert!(graph.is_current(&compiled));

        graph.remove_pass("only");
        assert!(!graph.is_current(&compiled));
    }
}
