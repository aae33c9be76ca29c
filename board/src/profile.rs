//! Compile-time board profiles.
//!
//! Exactly one profile is active per build, selected with a cargo feature.
//! Board code is written against [`BoardProfile`] so both boards share the
//! same detection and fixup logic.

/// Fixed facts about one carrier board.
pub trait BoardProfile {
    /// Name printed during boot.
    const NAME: &'static str;

    /// Strap pin encoding the populated txslot, if the board has one.
    const TXSLOT_STRAP: Option<&'static str>;

    /// Display engine nodes whose framebuffer carveout is handed on.
    const DISPLAY_NODES: &'static [&'static str];
}

/// Tegra186 SmartSense on the Royal Oak carrier.
pub struct RoyalOakSmartSense;

impl BoardProfile for RoyalOakSmartSense {
    const NAME: &'static str = "MIOVISION SMARTSENSE";
    const TXSLOT_STRAP: Option<&'static str> = Some("x6");
    const DISPLAY_NODES: &'static [&'static str] = &[
        "/host1x@13e00000/display-hub@15200000/display@15200000",
        "/host1x@13e00000/display-hub@15200000/display@15210000",
        "/host1x@13e00000/display-hub@15200000/display@15220000",
    ];
}

/// Tegra210 SmartSense on the Royal Oak CTM carrier.
pub struct SmartSense;

impl BoardProfile for SmartSense {
    const NAME: &'static str = "Royal Oak CTM";
    const TXSLOT_STRAP: Option<&'static str> = None;
    const DISPLAY_NODES: &'static [&'static str] = &[];
}

#[cfg(feature = "royaloak-smartsense")]
pub type ActiveBoard = RoyalOakSmartSense;

#[cfg(all(feature = "smartsense", not(feature = "royaloak-smartsense")))]
pub type ActiveBoard = SmartSense;

#[cfg(not(any(feature = "royaloak-smartsense", feature = "smartsense")))]
compile_error!("select a board with `royaloak-smartsense` or `smartsense`");
