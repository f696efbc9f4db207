//! Custom tracing layers for fieldcalc
//!
//! This module provides the layer that attaches the active device context to
//! spans, and the JSONL formatting layer used for console and file output.

use tracing::{Subscriber, span};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::fmt::format::{Format, Json, JsonFields};
use tracing_subscriber::{
    layer::{Context, Layer},
    registry::LookupSpan,
};

use crate::config::JsonlConfig;
use crate::context::{DeviceContextData, DeviceContextGuard};

/// Layer that attaches device context to spans
///
/// Every span opened while a [`DeviceContextGuard`] is active carries a
/// [`DeviceContextExtension`], which later layers can read back.
#[derive(Debug, Default, Clone, Copy)]
pub struct DeviceContextLayer;

impl DeviceContextLayer {
    /// Create a new device context layer
    pub fn new() -> Self {
        Self
    }
}

/// Extension data stored on spans
#[derive(Debug, Clone)]
pub struct DeviceContextExtension {
    pub data: DeviceContextData,
}

impl<S> Layer<S> for DeviceContextLayer
where
    S: Subscriber + for<'lookup> LookupSpan<'lookup>,
{
    fn on_new_span(&self, _attrs: &span::Attributes<'_>, id: &span::Id, ctx: Context<'_, S>) {
        if let Some(span) = ctx.span(id) {
            if let Some(device_ctx) = DeviceContextGuard::current() {
                span.extensions_mut()
                    .insert(DeviceContextExtension { data: device_ctx });
            }
        }
    }
}

/// JSON formatting layer type produced by [`jsonl_layer`]
pub type JsonlLayer<S, W> = tracing_subscriber::fmt::Layer<S, JsonFields, Format<Json>, W>;

/// Create a JSONL formatting layer writing to `writer`
pub fn jsonl_layer<S, W>(writer: W, config: &JsonlConfig) -> JsonlLayer<S, W>
where
    S: Subscriber + for<'lookup> LookupSpan<'lookup>,
    W: for<'writer> MakeWriter<'writer> + Send + Sync + 'static,
{
    tracing_subscriber::fmt::layer()
        .json()
        .with_current_span(config.include_current_span)
        .with_span_list(config.include_spans)
        .flatten_event(config.flatten_events)
        .with_file(config.include_location)
        .with_line_number(config.include_location)
        .with_thread_ids(config.include_thread_info)
        .with_thread_names(config.include_thread_info)
        .with_writer(writer)
}
