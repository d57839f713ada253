// ============================================================================
// REGION MASK — restrict the blur to a rectangle of the frame
// ============================================================================

use crate::config::FilterData;
use crate::gpu::effect::{Effect, ParamBlock};

// Configuration keys (persisted by the host).
pub const K_REGION: &str = "Filter.Blur.Region";
pub const K_REGION_LEFT: &str = "Filter.Blur.Region.Left";
pub const K_REGION_TOP: &str = "Filter.Blur.Region.Top";
pub const K_REGION_RIGHT: &str = "Filter.Blur.Region.Right";
pub const K_REGION_BOTTOM: &str = "Filter.Blur.Region.Bottom";
pub const K_REGION_FEATHER: &str = "Filter.Blur.Region.Feather";
pub const K_REGION_FEATHER_SHIFT: &str = "Filter.Blur.Region.Feather.Shift";
pub const K_REGION_INVERT: &str = "Filter.Blur.Region.Invert";

/// Rectangular mask state, in frame-normalized top-left-origin coordinates.
///
/// `right` and `bottom` hold `1 − configured inset` so all four bounds are
/// directly usable by the shaders. Fields other than `enabled` are only
/// meaningful while the mask is enabled; they keep stale values otherwise.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RegionConfig {
    pub enabled: bool,
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub feather: f32,
    pub feather_shift: f32,
    pub invert: bool,
}

impl RegionConfig {
    /// Re-read the mask from configuration. The rectangle is only resolved
    /// while the region is enabled.
    pub fn read_from(&mut self, data: &FilterData) {
        self.enabled = data.get_bool(K_REGION);
        if self.enabled {
            self.left = (data.get_double(K_REGION_LEFT) / 100.0) as f32;
            self.top = (data.get_double(K_REGION_TOP) / 100.0) as f32;
            self.right = 1.0 - (data.get_double(K_REGION_RIGHT) / 100.0) as f32;
            self.bottom = 1.0 - (data.get_double(K_REGION_BOTTOM) / 100.0) as f32;
            self.feather = (data.get_double(K_REGION_FEATHER) / 100.0) as f32;
            self.feather_shift = (data.get_double(K_REGION_FEATHER_SHIFT) / 100.0) as f32;
            self.invert = data.get_bool(K_REGION_INVERT);
        }
    }

    /// Select the technique variant the blur passes should run.
    pub fn technique(&self) -> &'static str {
        if !self.enabled {
            return "Draw";
        }
        match (self.feather > 0.0, self.invert) {
            (false, false) => "DrawRegion",
            (true, false) => "DrawRegionFeather",
            (false, true) => "DrawRegionInvert",
            (true, true) => "DrawRegionFeatherInvert",
        }
    }

    /// Bind the mask onto a program. Each parameter is set only if the
    /// program declares it — programs without region support just ignore
    /// the configuration.
    pub fn apply(&self, effect: &Effect, params: &mut ParamBlock<'_>) {
        if effect.has_parameter("regionLeft") {
            params.set_float("regionLeft", self.left);
        }
        if effect.has_parameter("regionTop") {
            params.set_float("regionTop", self.top);
        }
        if effect.has_parameter("regionRight") {
            params.set_float("regionRight", self.right);
        }
        if effect.has_parameter("regionBottom") {
            params.set_float("regionBottom", self.bottom);
        }
        if effect.has_parameter("regionFeather") {
            params.set_float("regionFeather", self.feather);
        }
        if effect.has_parameter("regionFeatherShift") {
            params.set_float("regionFeatherShift", self.feather_shift);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region_data(enabled: bool) -> FilterData {
        let mut data = FilterData::new();
        data.set_bool(K_REGION, enabled);
        data
    }

    #[test]
    fn bounds_normalize_from_host_percentages() {
        let mut data = region_data(true);
        data.set_double(K_REGION_LEFT, 10.0);
        data.set_double(K_REGION_TOP, 5.0);
        data.set_double(K_REGION_RIGHT, 30.0);
        data.set_double(K_REGION_BOTTOM, 0.0);

        let mut region = RegionConfig::default();
        region.read_from(&data);

        assert_eq!(region.left, 0.10);
        assert_eq!(region.top, 0.05);
        // Right/bottom are stored as 1 − inset.
        assert_eq!(region.right, 0.70);
        assert_eq!(region.bottom, 1.0);
    }

    #[test]
    fn disabled_region_keeps_stale_fields() {
        let mut region = RegionConfig {
            enabled: true,
            left: 0.25,
            ..Default::default()
        };
        let mut data = region_data(false);
        data.set_double(K_REGION_LEFT, 90.0);
        region.read_from(&data);

        assert!(!region.enabled);
        // Unused while disabled, so the old value is allowed to remain.
        assert_eq!(region.left, 0.25);
    }

    #[test]
    fn technique_selection_matches_region_state() {
        let mut region = RegionConfig::default();
        assert_eq!(region.technique(), "Draw");

        region.enabled = true;
        region.feather = 0.0;
        region.invert = false;
        assert_eq!(region.technique(), "DrawRegion");

        region.feather = 0.1;
        assert_eq!(region.technique(), "DrawRegionFeather");

        region.invert = true;
        assert_eq!(region.technique(), "DrawRegionFeatherInvert");

        region.feather = 0.0;
        assert_eq!(region.technique(), "DrawRegionInvert");
    }
}
