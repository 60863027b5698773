// crates/tradedesk-core/src/core/registry.rs
// ============================================================================
// Module: Command Registry
// Description: Tree of command groups and leaf command descriptors.
// Purpose: Build the full command surface once, before any dispatch.
// Dependencies: thiserror, crate::core::descriptor
// ============================================================================

//! ## Overview
//! The registry is a tree rooted at the program name. Interior nodes are
//! groups (`calendar`, `ibg`); leaves carry a [`CommandDescriptor`]. Groups
//! are created on demand, so registration order is irrelevant. The tree is
//! read-only once built.
//!
//! # Invariants
//! - A leaf never has children and a group never carries a descriptor.
//! - Sibling names are unique.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::descriptor::CommandDescriptor;
use crate::core::descriptor::DescriptorError;
use crate::core::identifiers::CommandPath;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Registry construction errors. These are programming defects and surface
/// at startup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// A sibling with the same name already exists.
    #[error("duplicate command: {0}")]
    DuplicateCommand(String),
    /// A command or group name was empty.
    #[error("command names must be non-empty")]
    EmptyName,
    /// A leaf would gain children or a group would become a leaf.
    #[error("leaf conflict at '{0}': leaves cannot have subcommands")]
    LeafConflict(String),
    /// A descriptor failed its own consistency check.
    #[error("invalid command '{command}': {reason}")]
    InvalidDescriptor {
        /// Command path.
        command: String,
        /// Inconsistency found.
        reason: DescriptorError,
    },
    /// A group was declared without any subcommands.
    #[error("command group '{0}' has no subcommands")]
    EmptyGroup(String),
    /// The descriptor's operation identifier is malformed.
    #[error("command '{command}' has malformed operation id '{operation}'")]
    MalformedOperation {
        /// Command path.
        command: String,
        /// Offending identifier.
        operation: String,
    },
}

// ============================================================================
// SECTION: Nodes
// ============================================================================

/// Node in the command tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandNode {
    /// Node name.
    pub name: String,
    /// Help text shown in group listings.
    pub help: String,
    /// Child nodes in registration order.
    pub children: Vec<Self>,
    /// Leaf descriptor; `None` for groups.
    pub descriptor: Option<CommandDescriptor>,
}

impl CommandNode {
    /// Creates an empty group node.
    fn group(name: &str) -> Self {
        Self {
            name: name.to_string(),
            help: String::new(),
            children: Vec::new(),
            descriptor: None,
        }
    }

    /// Returns the named child.
    #[must_use]
    pub fn child(&self, name: &str) -> Option<&Self> {
        self.children.iter().find(|child| child.name == name)
    }

    /// Returns true when this node is a leaf.
    #[must_use]
    pub const fn is_leaf(&self) -> bool {
        self.descriptor.is_some()
    }

    /// Returns the named child, creating a group when absent.
    fn child_group_mut(&mut self, name: &str, path: &CommandPath) -> Result<&mut Self, RegistryError> {
        if name.is_empty() {
            return Err(RegistryError::EmptyName);
        }
        let index = match self.children.iter().position(|child| child.name == name) {
            Some(index) => index,
            None => {
                self.children.push(Self::group(name));
                self.children.len() - 1
            }
        };
        let child = &mut self.children[index];
        if child.is_leaf() {
            return Err(RegistryError::LeafConflict(path.child(name).to_string()));
        }
        Ok(child)
    }
}

// ============================================================================
// SECTION: Registry
// ============================================================================

/// Command tree built once at process start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRegistry {
    /// Root node named after the program.
    root: CommandNode,
}

impl CommandRegistry {
    /// Creates an empty registry for a program.
    #[must_use]
    pub fn new(program: &str, help: &str) -> Self {
        let mut root = CommandNode::group(program);
        root.help = help.to_string();
        Self {
            root,
        }
    }

    /// Returns the root node.
    #[must_use]
    pub const fn root(&self) -> &CommandNode {
        &self.root
    }

    /// Attaches help text to a group, creating the group path if needed.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] when the path crosses a leaf or is empty.
    pub fn describe_group(&mut self, path: &[&str], help: &str) -> Result<(), RegistryError> {
        if path.is_empty() {
            return Err(RegistryError::EmptyName);
        }
        let node = self.group_mut(path)?;
        node.help = help.to_string();
        Ok(())
    }

    /// Inserts a leaf descriptor beneath the group `path`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] when the descriptor is inconsistent, its
    /// name collides with a sibling, or the path crosses a leaf.
    pub fn register(
        &mut self,
        path: &[&str],
        descriptor: CommandDescriptor,
    ) -> Result<(), RegistryError> {
        if descriptor.name.is_empty() {
            return Err(RegistryError::EmptyName);
        }
        let full_path = CommandPath::new(path.iter().copied()).child(&descriptor.name);
        descriptor.check().map_err(|reason| RegistryError::InvalidDescriptor {
            command: full_path.to_string(),
            reason,
        })?;
        if !descriptor.operation.is_well_formed() {
            return Err(RegistryError::MalformedOperation {
                command: full_path.to_string(),
                operation: descriptor.operation.to_string(),
            });
        }
        let parent = self.group_mut(path)?;
        if parent.child(&descriptor.name).is_some() {
            return Err(RegistryError::DuplicateCommand(full_path.to_string()));
        }
        parent.children.push(CommandNode {
            name: descriptor.name.clone(),
            help: descriptor.help.clone(),
            children: Vec::new(),
            descriptor: Some(descriptor),
        });
        Ok(())
    }

    /// Looks up a node by path (the empty path is the root).
    #[must_use]
    pub fn lookup(&self, path: &[&str]) -> Option<&CommandNode> {
        path.iter().try_fold(&self.root, |node, name| node.child(name))
    }

    /// Looks up a leaf descriptor by path.
    #[must_use]
    pub fn leaf(&self, path: &[&str]) -> Option<&CommandDescriptor> {
        self.lookup(path).and_then(|node| node.descriptor.as_ref())
    }

    /// Returns every leaf with its full path, depth first in registration order.
    #[must_use]
    pub fn leaves(&self) -> Vec<(CommandPath, &CommandDescriptor)> {
        let mut output = Vec::new();
        collect_leaves(&self.root, &CommandPath::default(), &mut output);
        output
    }

    /// Checks that every group has at least one child.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::EmptyGroup`] naming the first childless group.
    pub fn check_groups(&self) -> Result<(), RegistryError> {
        check_group(&self.root, &CommandPath::default())
    }

    /// Walks to the group at `path`, creating missing groups.
    fn group_mut(&mut self, path: &[&str]) -> Result<&mut CommandNode, RegistryError> {
        let mut node = &mut self.root;
        let mut walked = CommandPath::default();
        for name in path {
            node = node.child_group_mut(name, &walked)?;
            walked = walked.child(name);
        }
        Ok(node)
    }
}

/// Recursively gathers leaves beneath `node`.
fn collect_leaves<'a>(
    node: &'a CommandNode,
    path: &CommandPath,
    output: &mut Vec<(CommandPath, &'a CommandDescriptor)>,
) {
    for child in &node.children {
        let child_path = path.child(&child.name);
        if let Some(descriptor) = &child.descriptor {
            output.push((child_path, descriptor));
        } else {
            collect_leaves(child, &child_path, output);
        }
    }
}

/// Recursively rejects childless groups beneath `node`.
fn check_group(node: &CommandNode, path: &CommandPath) -> Result<(), RegistryError> {
    if node.is_leaf() {
        return Ok(());
    }
    if node.children.is_empty() {
        return Err(RegistryError::EmptyGroup(path.to_string()));
    }
    for child in &node.children {
        check_group(child, &path.child(&child.name))?;
    }
    Ok(())
}
