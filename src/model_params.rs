use serde::{Deserialize, Serialize};
use std::fmt;

/// One optional model feature a candidate can carry: how equilibrium
/// frequencies are treated, and which among-site rate variation terms are
/// switched on. Declaration order is the deterministic iteration and
/// tie-break order everywhere in the crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ParamVariant {
    EqualFreqs,
    MlFreqs,
    NoRateVar,
    InvSites,
    Gamma,
    InvGamma,
}

impl ParamVariant {
    pub const ALL: [ParamVariant; 6] = [
        ParamVariant::EqualFreqs,
        ParamVariant::MlFreqs,
        ParamVariant::NoRateVar,
        ParamVariant::InvSites,
        ParamVariant::Gamma,
        ParamVariant::InvGamma,
    ];

    #[inline(always)]
    fn bit(self) -> u8 {
        1 << (self as u8)
    }

    /// Conventional model-name suffix, e.g. `GTR` + `InvGamma` = `GTR+I+G`.
    pub fn suffix(&self) -> &'static str {
        match self {
            ParamVariant::EqualFreqs => "",
            ParamVariant::MlFreqs => "+F",
            ParamVariant::NoRateVar => "",
            ParamVariant::InvSites => "+I",
            ParamVariant::Gamma => "+G",
            ParamVariant::InvGamma => "+I+G",
        }
    }
}

/// Set of [`ParamVariant`] tags, the parameter-flag mask that spans the
/// candidate search space together with the matrix list.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParamMask(u8);

impl ParamMask {
    pub fn empty() -> Self {
        Self(0)
    }

    pub fn of(variants: &[ParamVariant]) -> Self {
        variants.iter().fold(Self::empty(), |mask, &v| mask.with(v))
    }

    #[must_use]
    pub fn with(self, variant: ParamVariant) -> Self {
        Self(self.0 | variant.bit())
    }

    #[inline(always)]
    pub fn contains(&self, variant: ParamVariant) -> bool {
        self.0 & variant.bit() != 0
    }

    /// Number of set tags, hence the per-matrix share of the registry.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn iter(&self) -> ParamMaskIter {
        ParamMaskIter {
            mask: *self,
            next: 0,
        }
    }
}

impl fmt::Display for ParamMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tags: Vec<String> = self.iter().map(|v| format!("{v:?}")).collect();
        write!(f, "{{{}}}", tags.join(","))
    }
}

/// Iterates the set tags in declaration order.
#[derive(Clone, Copy, Debug)]
pub struct ParamMaskIter {
    mask: ParamMask,
    next: usize,
}

impl Iterator for ParamMaskIter {
    type Item = ParamVariant;

    fn next(&mut self) -> Option<ParamVariant> {
        while self.next < ParamVariant::ALL.len() {
            let variant = ParamVariant::ALL[self.next];
            self.next += 1;
            if self.mask.contains(variant) {
                return Some(variant);
            }
        }
        None
    }
}
