//! Modifier stack.

use shade_bevel::BevelParams;

/// A non-destructive mesh modifier.
#[derive(Debug, Clone, PartialEq)]
pub enum Modifier {
    /// Bevel weighted edges (or their endpoints).
    Bevel(BevelParams),

    /// Move each vertex along its area-weighted normal.
    Displace {
        /// Signed displacement distance.
        distance: f64,
    },

    /// Laplacian smoothing toward the neighbor average.
    Smooth {
        /// Blend factor in `[0, 1]` per iteration.
        factor: f64,
        /// Number of smoothing iterations.
        iterations: u32,
    },
}

impl Modifier {
    /// Short kind name for logs and status strings.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Bevel(_) => "bevel",
            Self::Displace { .. } => "displace",
            Self::Smooth { .. } => "smooth",
        }
    }

    /// Whether this is a bevel modifier.
    #[must_use]
    pub const fn is_bevel(&self) -> bool {
        matches!(self, Self::Bevel(_))
    }
}

/// A named, toggleable entry in a [`ModifierStack`].
#[derive(Debug, Clone, PartialEq)]
pub struct ModifierEntry {
    /// Entry name, unique per caller convention.
    pub name: String,
    /// The modifier.
    pub modifier: Modifier,
    /// Disabled entries are skipped during evaluation.
    pub enabled: bool,
}

/// An ordered list of named modifiers.
///
/// # Example
///
/// ```
/// use shade_eval::{Modifier, ModifierStack};
/// use shade_bevel::BevelParams;
///
/// let mut stack = ModifierStack::new();
/// stack.append("bevel", Modifier::Bevel(BevelParams::default()));
/// stack.append("relax", Modifier::Smooth { factor: 0.5, iterations: 2 });
///
/// assert_eq!(stack.len(), 2);
/// assert!(stack.find_bevel().is_some());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModifierStack {
    entries: Vec<ModifierEntry>,
}

impl ModifierStack {
    /// Create an empty stack.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries, including disabled ones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the stack has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append an enabled modifier.
    pub fn append(&mut self, name: impl Into<String>, modifier: Modifier) {
        self.entries.push(ModifierEntry {
            name: name.into(),
            modifier,
            enabled: true,
        });
    }

    /// Iterate over entries in stack order.
    pub fn iter(&self) -> impl Iterator<Item = &ModifierEntry> {
        self.entries.iter()
    }

    /// Find an entry by name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&ModifierEntry> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    /// The first bevel entry, if any.
    #[must_use]
    pub fn find_bevel(&self) -> Option<(&str, &BevelParams)> {
        self.entries.iter().find_map(|entry| match &entry.modifier {
            Modifier::Bevel(params) => Some((entry.name.as_str(), params)),
            _ => None,
        })
    }

    /// Enable or disable an entry. Returns false if the name is unknown.
    pub fn set_enabled(&mut self, name: &str, enabled: bool) -> bool {
        if let Some(entry) = self.entries.iter_mut().find(|entry| entry.name == name) {
            entry.enabled = enabled;
            true
        } else {
            false
        }
    }

    /// Remove an entry by name.
    pub fn remove(&mut self, name: &str) -> Option<ModifierEntry> {
        let pos = self.entries.iter().position(|entry| entry.name == name)?;
        Some(self.entries.remove(pos))
    }
}
