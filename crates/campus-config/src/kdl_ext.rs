// Helper functions for extracting values from KDL nodes

use kdl::KdlNode;

use crate::{ConfigError, ConfigResult};

pub(crate) fn first_string_arg(node: &KdlNode) -> Option<String> {
    node.entries()
        .iter()
        .find(|e| e.name().is_none())
        .and_then(|e| e.value().as_string())
        .map(|s| s.to_string())
}

pub(crate) fn all_string_args(node: &KdlNode) -> Vec<String> {
    node.entries()
        .iter()
        .filter(|e| e.name().is_none())
        .filter_map(|e| e.value().as_string())
        .map(|s| s.to_string())
        .collect()
}

pub(crate) fn first_integer_arg(node: &KdlNode) -> Option<i128> {
    node.entries()
        .iter()
        .find(|e| e.name().is_none())
        .and_then(|e| e.value().as_integer())
}

pub(crate) fn first_bool_arg(node: &KdlNode) -> Option<bool> {
    node.entries()
        .iter()
        .find(|e| e.name().is_none())
        .and_then(|e| e.value().as_bool())
}

pub(crate) fn string_prop(node: &KdlNode, name: &str) -> Option<String> {
    node.get(name)
        .and_then(|v| v.as_string())
        .map(|s| s.to_string())
}

pub(crate) fn integer_prop(node: &KdlNode, name: &str) -> Option<i128> {
    node.get(name).and_then(|v| v.as_integer())
}

pub(crate) fn bool_prop(node: &KdlNode, name: &str) -> Option<bool> {
    node.get(name).and_then(|v| v.as_bool())
}

/// Look up a setting given either as a property (`name=value`) or as a child
/// node (`name value`).
pub(crate) fn setting_string(node: &KdlNode, name: &str) -> Option<String> {
    string_prop(node, name).or_else(|| child(node, name).and_then(first_string_arg))
}

pub(crate) fn setting_integer(node: &KdlNode, name: &str) -> Option<i128> {
    integer_prop(node, name).or_else(|| child(node, name).and_then(first_integer_arg))
}

pub(crate) fn setting_bool(node: &KdlNode, name: &str) -> Option<bool> {
    bool_prop(node, name).or_else(|| child(node, name).and_then(first_bool_arg))
}

pub(crate) fn child<'a>(node: &'a KdlNode, name: &str) -> Option<&'a KdlNode> {
    node.children()?
        .nodes()
        .iter()
        .find(|c| c.name().value() == name)
}

/// Convert an integer setting to an unsigned value, rejecting negatives and overflow.
pub(crate) fn to_unsigned<T: TryFrom<i128>>(field: &str, value: i128) -> ConfigResult<T> {
    T::try_from(value).map_err(|_| ConfigError::Invalid {
        setting: field.to_string(),
        reason: format!("{} is out of range", value),
    })
}
