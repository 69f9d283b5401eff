//! Bundle flags: which halves of each action may carry value.

use shroud_config::BuilderConfig;

const FLAG_SPENDS_ENABLED: u8 = 0b0000_0001;
const FLAG_OUTPUTS_ENABLED: u8 = 0b0000_0010;
const FLAGS_EXPECTED_UNSET: u8 = !(FLAG_SPENDS_ENABLED | FLAG_OUTPUTS_ENABLED);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Flags {
    spends_enabled: bool,
    outputs_enabled: bool,
}

impl Flags {
    pub const ENABLED: Flags = Flags {
        spends_enabled: true,
        outputs_enabled: true,
    };

    pub const SPENDS_DISABLED: Flags = Flags {
        spends_enabled: false,
        outputs_enabled: true,
    };

    pub const OUTPUTS_DISABLED: Flags = Flags {
        spends_enabled: true,
        outputs_enabled: false,
    };

    pub const fn from_parts(spends_enabled: bool, outputs_enabled: bool) -> Self {
        Flags {
            spends_enabled,
            outputs_enabled,
        }
    }

    pub fn spends_enabled(&self) -> bool {
        self.spends_enabled
    }

    pub fn outputs_enabled(&self) -> bool {
        self.outputs_enabled
    }

    pub fn to_byte(&self) -> u8 {
        let mut value = 0u8;
        if self.spends_enabled {
            value |= FLAG_SPENDS_ENABLED;
        }
        if self.outputs_enabled {
            value |= FLAG_OUTPUTS_ENABLED;
        }
        value
    }

    /// `None` if any reserved bit is set.
    pub fn from_byte(value: u8) -> Option<Self> {
        if value & FLAGS_EXPECTED_UNSET != 0 {
            return None;
        }
        Some(Self::from_parts(
            value & FLAG_SPENDS_ENABLED != 0,
            value & FLAG_OUTPUTS_ENABLED != 0,
        ))
    }
}

impl Default for Flags {
    fn default() -> Self {
        Flags::ENABLED
    }
}

impl From<&BuilderConfig> for Flags {
    fn from(config: &BuilderConfig) -> Self {
        Flags::from_parts(config.spends_enabled, config.outputs_enabled)
    }
}
