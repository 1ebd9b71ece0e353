//! Phase - aggregate label of a box.

/// Aggregate label of a box, derived from the points it contains.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Phase<L> {
  /// No point has been added yet.
  Unset,
  /// Every point carries this label.
  Value(L),
  /// Points carry at least two distinct labels.
  Undefined,
}

impl<L> Default for Phase<L> {
  fn default() -> Self {
    Self::Unset
  }
}

impl<L: PartialEq + Clone> Phase<L> {
  /// Fold one more label into the phase.
  ///
  /// Returns `true` only on the transition into [`Phase::Undefined`].
  pub fn absorb(&mut self, label: &L) -> bool {
    match self {
      Self::Unset => {
        *self = Self::Value(label.clone());
        false
      }
      Self::Value(current) if current == label => false,
      Self::Value(_) => {
        *self = Self::Undefined;
        true
      }
      Self::Undefined => false,
    }
  }
}

impl<L> Phase<L> {
  /// True if no point has been added.
  #[inline]
  pub fn is_unset(&self) -> bool {
    matches!(self, Self::Unset)
  }

  /// True if the points disagree.
  #[inline]
  pub fn is_undefined(&self) -> bool {
    matches!(self, Self::Undefined)
  }

  /// The common label, if there is one.
  pub fn value(&self) -> Option<&L> {
    match self {
      Self::Value(label) => Some(label),
      _ => None,
    }
  }
}
