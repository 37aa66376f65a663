//! Options accepted by the navigator.

/// NodeOption controls GetNode and SetNode behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeOption {
    /// Match list entries on the keys present in the path, treating absent
    /// keys and `*` values as wildcards, and return every match.
    PartialKeyMatch,

    /// Create absent containers and list entries on the way to the target.
    InitMissingElements,
}

pub(crate) fn has_option(opts: &[NodeOption], opt: NodeOption) -> bool {
    opts.contains(&opt)
}
