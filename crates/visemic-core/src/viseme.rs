//! Viseme channel sets
//!
//! Output curves address the 15-channel ARKit set. Phoneme lookup goes
//! through a 22-entry intermediate set first; [`remap_intermediate`] folds
//! it down with a fixed table.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of output viseme channels
pub const VISEME_CHANNEL_COUNT: usize = 15;

/// Number of entries in the intermediate viseme set
pub const INTERMEDIATE_VISEME_COUNT: usize = 22;

/// Output viseme channel index, always `< VISEME_CHANNEL_COUNT`
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub struct VisemeId(u8);

impl VisemeId {
    /// Build from a raw index. Out-of-range indices resolve to the
    /// closed-mouth channel.
    #[inline]
    pub fn new(index: u8) -> Self {
        if (index as usize) < VISEME_CHANNEL_COUNT {
            VisemeId(index)
        } else {
            CLOSED_MOUTH
        }
    }

    #[inline]
    pub fn index(self) -> u8 {
        self.0
    }

    /// Named channel for this id
    pub fn channel(self) -> ArkitViseme {
        ArkitViseme::ALL[self.0 as usize]
    }

    /// Every output channel in index order
    pub fn all() -> impl Iterator<Item = VisemeId> {
        (0..VISEME_CHANNEL_COUNT as u8).map(VisemeId)
    }
}

impl fmt::Debug for VisemeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Viseme({}:{})", self.0, self.channel().name())
    }
}

impl fmt::Display for VisemeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u8> for VisemeId {
    fn from(index: u8) -> Self {
        VisemeId::new(index)
    }
}

impl From<VisemeId> for u8 {
    fn from(id: VisemeId) -> Self {
        id.0
    }
}

impl From<ArkitViseme> for VisemeId {
    fn from(v: ArkitViseme) -> Self {
        VisemeId(v as u8)
    }
}

/// Rest pose channel. Pauses and anything unrecognized land here.
pub const CLOSED_MOUTH: VisemeId = VisemeId(0);

/// The 15 output channels
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ArkitViseme {
    /// Silence / rest
    Sil = 0,
    /// p, b, m (lips pressed)
    PP = 1,
    /// f, v (teeth on lip)
    FF = 2,
    /// th, dh
    TH = 3,
    /// d, t, n
    DD = 4,
    /// k, g, ng
    Kk = 5,
    /// ch, j, sh, zh
    CH = 6,
    /// s, z
    SS = 7,
    /// l
    Nn = 8,
    /// r, er
    RR = 9,
    /// open vowels
    Aa = 10,
    /// mid front vowels
    E = 11,
    /// close front vowels
    Ih = 12,
    /// rounded mid vowels
    Oh = 13,
    /// rounded close vowels
    Ou = 14,
}

impl ArkitViseme {
    pub const ALL: [ArkitViseme; VISEME_CHANNEL_COUNT] = [
        ArkitViseme::Sil,
        ArkitViseme::PP,
        ArkitViseme::FF,
        ArkitViseme::TH,
        ArkitViseme::DD,
        ArkitViseme::Kk,
        ArkitViseme::CH,
        ArkitViseme::SS,
        ArkitViseme::Nn,
        ArkitViseme::RR,
        ArkitViseme::Aa,
        ArkitViseme::E,
        ArkitViseme::Ih,
        ArkitViseme::Oh,
        ArkitViseme::Ou,
    ];

    /// Blendshape-style channel name
    pub fn name(self) -> &'static str {
        match self {
            ArkitViseme::Sil => "sil",
            ArkitViseme::PP => "PP",
            ArkitViseme::FF => "FF",
            ArkitViseme::TH => "TH",
            ArkitViseme::DD => "DD",
            ArkitViseme::Kk => "kk",
            ArkitViseme::CH => "CH",
            ArkitViseme::SS => "SS",
            ArkitViseme::Nn => "nn",
            ArkitViseme::RR => "RR",
            ArkitViseme::Aa => "aa",
            ArkitViseme::E => "E",
            ArkitViseme::Ih => "ih",
            ArkitViseme::Oh => "oh",
            ArkitViseme::Ou => "ou",
        }
    }

    /// Articulatory class of the channel
    pub fn class(self) -> PhoneticClass {
        match self {
            ArkitViseme::Sil => PhoneticClass::Rest,
            ArkitViseme::PP | ArkitViseme::DD | ArkitViseme::Kk => PhoneticClass::Stop,
            ArkitViseme::Nn => PhoneticClass::Nasal,
            ArkitViseme::FF | ArkitViseme::TH | ArkitViseme::SS | ArkitViseme::CH => {
                PhoneticClass::Fricative
            }
            ArkitViseme::RR => PhoneticClass::Approximant,
            ArkitViseme::Aa
            | ArkitViseme::E
            | ArkitViseme::Ih
            | ArkitViseme::Oh
            | ArkitViseme::Ou => PhoneticClass::Vowel,
        }
    }
}

/// Coarse articulatory class used for context-sensitive blending
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PhoneticClass {
    Rest,
    Vowel,
    Stop,
    Nasal,
    Fricative,
    Approximant,
}

impl PhoneticClass {
    #[inline]
    pub fn is_vowel(self) -> bool {
        self == PhoneticClass::Vowel
    }

    /// Everything articulated that is not a vowel
    #[inline]
    pub fn is_consonant(self) -> bool {
        !matches!(self, PhoneticClass::Vowel | PhoneticClass::Rest)
    }
}

/// Intermediate viseme id (22-entry set, SAPI numbering)
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct IntermediateViseme(pub u8);

impl IntermediateViseme {
    pub const SILENCE: IntermediateViseme = IntermediateViseme(0);
    /// ae, ax, ah
    pub const AE_AX_AH: IntermediateViseme = IntermediateViseme(1);
    pub const AA: IntermediateViseme = IntermediateViseme(2);
    pub const AO: IntermediateViseme = IntermediateViseme(3);
    /// ey, eh, uh
    pub const EY_EH_UH: IntermediateViseme = IntermediateViseme(4);
    pub const ER: IntermediateViseme = IntermediateViseme(5);
    /// y, iy, ih, ix
    pub const Y_IY_IH_IX: IntermediateViseme = IntermediateViseme(6);
    /// w, uw
    pub const W_UW: IntermediateViseme = IntermediateViseme(7);
    pub const OW: IntermediateViseme = IntermediateViseme(8);
    pub const AW: IntermediateViseme = IntermediateViseme(9);
    pub const OY: IntermediateViseme = IntermediateViseme(10);
    pub const AY: IntermediateViseme = IntermediateViseme(11);
    pub const H: IntermediateViseme = IntermediateViseme(12);
    pub const R: IntermediateViseme = IntermediateViseme(13);
    pub const L: IntermediateViseme = IntermediateViseme(14);
    /// s, z
    pub const S_Z: IntermediateViseme = IntermediateViseme(15);
    /// sh, ch, jh, zh
    pub const SH_CH_JH_ZH: IntermediateViseme = IntermediateViseme(16);
    /// th, dh
    pub const TH_DH: IntermediateViseme = IntermediateViseme(17);
    /// f, v
    pub const F_V: IntermediateViseme = IntermediateViseme(18);
    /// d, t, n
    pub const D_T_N: IntermediateViseme = IntermediateViseme(19);
    /// k, g, ng
    pub const K_G_NG: IntermediateViseme = IntermediateViseme(20);
    /// p, b, m
    pub const P_B_M: IntermediateViseme = IntermediateViseme(21);
}

/// Intermediate (22) → output (15) channel table. Must stay bit-exact for
/// visual parity with hosts tuned against it.
pub const INTERMEDIATE_TO_ARKIT: [u8; INTERMEDIATE_VISEME_COUNT] = [
    0, 10, 10, 13, 11, 9, 12, 14, 13, 10, 13, 10, 11, 9, 8, 7, 6, 3, 2, 4, 5, 1,
];

/// Fold an intermediate id into the output channel set.
/// Out-of-range ids map to [`CLOSED_MOUTH`].
#[inline]
pub fn remap_intermediate(id: IntermediateViseme) -> VisemeId {
    INTERMEDIATE_TO_ARKIT
        .get(id.0 as usize)
        .map(|&idx| VisemeId(idx))
        .unwrap_or(CLOSED_MOUTH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viseme_id_out_of_range_is_closed() {
        assert_eq!(VisemeId::new(3).index(), 3);
        assert_eq!(VisemeId::new(15), CLOSED_MOUTH);
        assert_eq!(VisemeId::new(255), CLOSED_MOUTH);
    }

    #[test]
    fn test_remap_table_shape() {
        assert_eq!(remap_intermediate(IntermediateViseme::SILENCE), CLOSED_MOUTH);
        assert_eq!(
            remap_intermediate(IntermediateViseme::P_B_M),
            VisemeId::from(ArkitViseme::PP)
        );
        assert_eq!(
            remap_intermediate(IntermediateViseme::S_Z),
            VisemeId::from(ArkitViseme::SS)
        );
        assert_eq!(remap_intermediate(IntermediateViseme(200)), CLOSED_MOUTH);
    }

    #[test]
    fn test_remap_targets_valid_channels() {
        for raw in 0..INTERMEDIATE_VISEME_COUNT as u8 {
            let id = remap_intermediate(IntermediateViseme(raw));
            assert!((id.index() as usize) < VISEME_CHANNEL_COUNT);
        }
    }

    #[test]
    fn test_channel_classes() {
        assert!(ArkitViseme::Aa.class().is_vowel());
        assert!(ArkitViseme::PP.class().is_consonant());
        assert!(!ArkitViseme::Sil.class().is_consonant());
        assert_eq!(ArkitViseme::Nn.class(), PhoneticClass::Nasal);
    }

    #[test]
    fn test_all_channels_roundtrip_index() {
        for (i, ch) in ArkitViseme::ALL.iter().enumerate() {
            assert_eq!(*ch as usize, i);
            assert_eq!(VisemeId::from(*ch).channel(), *ch);
        }
    }
}
