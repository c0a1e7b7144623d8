//! Freezing and unfreezing parameters across a network's module tree.
//!
//! Each node only knows how to toggle the parameters it owns directly;
//! the free functions here walk the tree depth-first.

use tracing::info;

use crate::error::{Result, SegError};

/// A node in a network's module tree
pub trait ParameterNode {
    fn name(&self) -> &str;

    /// Set trainability of parameters owned directly by this node
    fn set_owned_trainable(&mut self, trainable: bool);

    /// (trainable, frozen) counts of parameters owned directly by this node
    fn owned_counts(&self) -> TrainabilityCount;

    fn children(&self) -> Vec<&dyn ParameterNode>;

    fn children_mut(&mut self) -> Vec<&mut dyn ParameterNode>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrainabilityCount {
    pub trainable: usize,
    pub frozen: usize,
}

impl std::ops::Add for TrainabilityCount {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            trainable: self.trainable + rhs.trainable,
            frozen: self.frozen + rhs.frozen,
        }
    }
}

/// Set trainability on a node and everything below it
pub fn set_trainable(node: &mut dyn ParameterNode, trainable: bool) {
    node.set_owned_trainable(trainable);
    for child in node.children_mut() {
        set_trainable(child, trainable);
    }
}

/// Count parameters over a whole subtree
pub fn count_trainability(node: &dyn ParameterNode) -> TrainabilityCount {
    node.children()
        .into_iter()
        .fold(node.owned_counts(), |acc, child| acc + count_trainability(child))
}

fn find_child_mut<'a>(node: &'a mut dyn ParameterNode, name: &str) -> Option<&'a mut dyn ParameterNode> {
    node.children_mut().into_iter().find(|c| c.name() == name)
}

fn toggle_base(network: &mut dyn ParameterNode, trainable: bool) -> Result<TrainabilityCount> {
    let network_name = network.name().to_string();
    let base = find_child_mut(network, "base_net").ok_or_else(|| {
        SegError::Configuration(format!("{network_name} has no base_net module"))
    })?;
    set_trainable(base, trainable);

    let counts = count_trainability(network);
    info!(
        "Parameters unfrozen = {}, Parameters frozen = {}",
        counts.trainable, counts.frozen
    );
    Ok(counts)
}

/// Freeze the `base_net` backbone of a network
pub fn freeze_base(network: &mut dyn ParameterNode) -> Result<TrainabilityCount> {
    toggle_base(network, false)
}

/// Unfreeze the `base_net` backbone of a network
pub fn unfreeze_base(network: &mut dyn ParameterNode) -> Result<TrainabilityCount> {
    toggle_base(network, true)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    pub trainable: bool,
}

impl Parameter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            trainable: true,
        }
    }
}

/// A named module owning parameters and submodules
#[derive(Debug, Clone, Default)]
pub struct ModuleNode {
    pub name: String,
    pub params: Vec<Parameter>,
    pub children: Vec<ModuleNode>,
}

impl ModuleNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_params(mut self, names: &[&str]) -> Self {
        self.params.extend(names.iter().map(|n| Parameter::new(*n)));
        self
    }

    pub fn with_child(mut self, child: ModuleNode) -> Self {
        self.children.push(child);
        self
    }
}

impl ParameterNode for ModuleNode {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_owned_trainable(&mut self, trainable: bool) {
        for param in &mut self.params {
            param.trainable = trainable;
        }
    }

    fn owned_counts(&self) -> TrainabilityCount {
        let trainable = self.params.iter().filter(|p| p.trainable).count();
        TrainabilityCount {
            trainable,
            frozen: self.params.len() - trainable,
        }
    }

    fn children(&self) -> Vec<&dyn ParameterNode> {
        self.children.iter().map(|c| c as &dyn ParameterNode).collect()
    }

    fn children_mut(&mut self) -> Vec<&mut dyn ParameterNode> {
        self.children
            .iter_mut()
            .map(|c| c as &mut dyn ParameterNode)
            .collect()
    }
}
