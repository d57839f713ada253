// ============================================================================
// HOST CONTRACT — how the video host drives filter instances
// ============================================================================
//
// The host keeps one `FilterInfo` per registered filter kind and a boxed
// `VideoFilter` per attached instance. All per-frame work happens inside
// `video_render`, which either composites into the provided output view or
// returns `Skipped` to make the host present the unmodified source.

use std::collections::HashMap;

use crate::config::FilterData;
use crate::gpu::GpuContext;

/// Source output capability flags.
pub const OUTPUT_VIDEO: u32 = 1 << 0;

/// A source that can render its current frame on request.
///
/// Implemented by the host for real source chains; the filter only ever asks
/// for the base dimensions and for the unfiltered frame to be written into
/// one of its capture textures.
pub trait FrameSource {
    fn name(&self) -> &str;
    fn base_width(&self) -> u32;
    fn base_height(&self) -> u32;

    /// Render the unfiltered frame into `target`. Returns `false` when the
    /// source cannot produce a frame this tick.
    fn draw_frame(&self, gpu: &GpuContext, target: &wgpu::Texture) -> bool;
}

/// Everything a filter needs for one `video_render` call.
pub struct FrameContext<'a> {
    pub gpu: &'a GpuContext,
    /// Source directly upstream of the filter.
    pub target: Option<&'a dyn FrameSource>,
    /// Root source the filter chain is attached to.
    pub parent: Option<&'a dyn FrameSource>,
    /// Destination the composited result is drawn into.
    pub output: &'a wgpu::TextureView,
}

/// Outcome of a `video_render` call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterOutput {
    /// The filter composited into the output view.
    Rendered,
    /// The host should present the unmodified source instead.
    Skipped,
}

/// Per-instance filter hooks, dispatched by the host.
pub trait VideoFilter {
    fn update(&mut self, data: &FilterData);

    fn activate(&mut self) {}
    fn deactivate(&mut self) {}
    fn video_tick(&mut self, _seconds: f32) {}

    fn video_render(&mut self, frame: &mut FrameContext<'_>) -> FilterOutput;

    /// Filters that keep the frame size report zero; the host then falls
    /// back to the source dimensions.
    fn width(&self) -> u32 {
        0
    }
    fn height(&self) -> u32 {
        0
    }
}

/// Factory function building a filter instance for a named source.
pub type CreateFilter = Box<dyn Fn(&FilterData, &str) -> Box<dyn VideoFilter> + Send + Sync>;

/// Registration record the host keeps per filter kind.
pub struct FilterInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub output_flags: u32,
    pub get_defaults: fn(&mut FilterData),
    pub create: CreateFilter,
}

/// Minimal registration table standing in for the host's source registry.
#[derive(Default)]
pub struct FilterHost {
    filters: HashMap<&'static str, FilterInfo>,
}

impl FilterHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, info: FilterInfo) {
        self.filters.insert(info.id, info);
    }

    pub fn info(&self, id: &str) -> Option<&FilterInfo> {
        self.filters.get(id)
    }

    /// Build a settings object pre-populated with the filter's defaults.
    pub fn defaults(&self, id: &str) -> Option<FilterData> {
        let info = self.filters.get(id)?;
        let mut data = FilterData::new();
        (info.get_defaults)(&mut data);
        Some(data)
    }

    /// Instantiate a filter attached to a source named `source_name`.
    pub fn create_filter(
        &self,
        id: &str,
        data: &FilterData,
        source_name: &str,
    ) -> Option<Box<dyn VideoFilter>> {
        let info = self.filters.get(id)?;
        Some((info.create)(data, source_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NullFilter {
        updates: u32,
    }

    impl VideoFilter for NullFilter {
        fn update(&mut self, _data: &FilterData) {
            self.updates += 1;
        }

        fn video_render(&mut self, _frame: &mut FrameContext<'_>) -> FilterOutput {
            FilterOutput::Skipped
        }
    }

    fn null_info() -> FilterInfo {
        FilterInfo {
            id: "null-filter",
            name: "Null",
            output_flags: OUTPUT_VIDEO,
            get_defaults: |data| data.set_default_int("null.mode", 3),
            create: Box::new(|_data, _source| {
                Box::new(NullFilter { updates: 0 }) as Box<dyn VideoFilter>
            }),
        }
    }

    #[test]
    fn registered_filters_resolve_defaults_and_instances() {
        let mut host = FilterHost::new();
        host.register(null_info());

        let defaults = host.defaults("null-filter").unwrap();
        assert_eq!(defaults.get_int("null.mode"), 3);

        let mut filter = host
            .create_filter("null-filter", &defaults, "some-source")
            .unwrap();
        filter.update(&defaults);
        assert_eq!(filter.width(), 0);
        assert_eq!(filter.height(), 0);
    }

    #[test]
    fn unknown_ids_resolve_to_nothing() {
        let host = FilterHost::new();
        assert!(host.info("missing").is_none());
        assert!(host.defaults("missing").is_none());
    }
}
