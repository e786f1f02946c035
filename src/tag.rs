//! Allocation tags.
//!
//! A closed enum classifying an allocation's purpose, enabling per-category
//! accounting and leak attribution. Every allocation made through
//! [`crate::memory::MemoryPool`] carries one of these tags; the pool keeps a
//! per-tag list of live allocations so [`crate::memory::MemoryPool::detect_leaks`]
//! can report exactly which subsystem leaked.

/// Tag attached to every pooled allocation.
///
/// `#[repr(u32)]` so the discriminant can be used directly as an index into
/// the pool's per-tag allocation table — [`MemoryTag::COUNT`] is that
/// table's length, derived from the enum itself rather than a
/// hand-maintained constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum MemoryTag {
    None = 0,
    Engine,
    Application,
    Platform,
    Audio,
    Video,
    Input,
    Renderer,
    Physics,
    Network,
    Scripting,
    Asset,
    Editor,
    Game,
    Component,
    Plugin,
    Arena,
    String,
    Array,
    Dict,
    RingQueue,
    Bst,
    Job,
    Texture,
    Material,
    Transform,
    Entity,
    Scene,
}

impl MemoryTag {
    /// Number of distinct tags, i.e. `TAG_MAX` from the spec.
    pub const COUNT: usize = Self::Scene as usize + 1;

    /// All tags in declaration order, for iterating leak reports.
    pub const ALL: [MemoryTag; Self::COUNT] = [
        MemoryTag::None,
        MemoryTag::Engine,
        MemoryTag::Application,
        MemoryTag::Platform,
        MemoryTag::Audio,
        MemoryTag::Video,
        MemoryTag::Input,
        MemoryTag::Renderer,
        MemoryTag::Physics,
        MemoryTag::Network,
        MemoryTag::Scripting,
        MemoryTag::Asset,
        MemoryTag::Editor,
        MemoryTag::Game,
        MemoryTag::Component,
        MemoryTag::Plugin,
        MemoryTag::Arena,
        MemoryTag::String,
        MemoryTag::Array,
        MemoryTag::Dict,
        MemoryTag::RingQueue,
        MemoryTag::Bst,
        MemoryTag::Job,
        MemoryTag::Texture,
        MemoryTag::Material,
        MemoryTag::Transform,
        MemoryTag::Entity,
        MemoryTag::Scene,
    ];

    /// The tag's table index, for indexing per-tag allocation lists.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Human-readable name, used in leak reports and log lines.
    pub const fn name(self) -> &'static str {
        match self {
            MemoryTag::None => "none",
            MemoryTag::Engine => "engine",
            MemoryTag::Application => "application",
            MemoryTag::Platform => "platform",
            MemoryTag::Audio => "audio",
            MemoryTag::Video => "video",
            MemoryTag::Input => "input",
            MemoryTag::Renderer => "renderer",
            MemoryTag::Physics => "physics",
            MemoryTag::Network => "network",
            MemoryTag::Scripting => "scripting",
            MemoryTag::Asset => "asset",
            MemoryTag::Editor => "editor",
            MemoryTag::Game => "game",
            MemoryTag::Component => "component",
            MemoryTag::Plugin => "plugin",
            MemoryTag::Arena => "arena",
            MemoryTag::String => "string",
            MemoryTag::Array => "array",
            MemoryTag::Dict => "dict",
            MemoryTag::RingQueue => "ring_queue",
            MemoryTag::Bst => "bst",
            MemoryTag::Job => "job",
            MemoryTag::Texture => "texture",
            MemoryTag::Material => "material",
            MemoryTag::Transform => "transform",
            MemoryTag::Entity => "entity",
            MemoryTag::Scene => "scene",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_matches_all_len() {
        assert_eq!(MemoryTag::COUNT, MemoryTag::ALL.len());
    }

    #[test]
    fn indices_are_dense() {
        for (i, tag) in MemoryTag::ALL.iter().enumerate() {
            assert_eq!(tag.index(), i);
        }
    }
}
