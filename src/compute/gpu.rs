//! GPU dispatch (§4.5-§4.7): uploads text/pattern/program buffers, runs
//! the literal or regex compute shader, and reads the match records back.
//!
//! Device context initialization is lazy and process-lifetime: the first
//! dispatch that needs a device probes for one via [`wgpu::Instance`];
//! every later dispatch reuses it (or its absence) without re-probing.

use super::config::DeviceConfig;
use crate::command::SubstFlags;
use crate::error::EngineError;
use crate::literal::MatchRecord;
use crate::regex::device::DeviceProgram;
use once_cell::sync::OnceCell;
use std::borrow::Cow;
use wgpu::util::DeviceExt;

const LITERAL_SHADER: &str = include_str!("shaders/literal.wgsl");
const REGEX_SHADER: &str = include_str!("shaders/regex.wgsl");

/// Mirrors §8 invariant 11: inputs up to and including this size may
/// dispatch to the device; anything larger always falls back to host.
pub const MAX_TEXT_BYTES: usize = 64 * 1024 * 1024;

struct GpuContext {
    device: wgpu::Device,
    queue: wgpu::Queue,
    literal_pipeline: wgpu::ComputePipeline,
    regex_pipeline: wgpu::ComputePipeline,
}

static CONTEXT: OnceCell<Option<GpuContext>> = OnceCell::new();

pub fn is_available() -> bool {
    context().is_some()
}

fn context() -> Option<&'static GpuContext> {
    CONTEXT.get_or_init(init_context).as_ref()
}

fn init_context() -> Option<GpuContext> {
    pollster::block_on(async {
        let instance = wgpu::Instance::default();
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await?;
        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("vsed-device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::downlevel_defaults(),
                },
                None,
            )
            .await
            .ok()?;

        let literal_pipeline = build_pipeline(&device, "vsed-literal", LITERAL_SHADER);
        let regex_pipeline = build_pipeline(&device, "vsed-regex", REGEX_SHADER);
        Some(GpuContext { device, queue, literal_pipeline, regex_pipeline })
    })
}

fn build_pipeline(device: &wgpu::Device, label: &str, source: &str) -> wgpu::ComputePipeline {
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(source)),
    });
    device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
        label: Some(label),
        layout: None,
        module: &module,
        entry_point: "main",
        compilation_options: wgpu::PipelineCompilationOptions::default(),
        cache: None,
    })
}

fn check_size(len: usize) -> Result<(), EngineError> {
    if len > MAX_TEXT_BYTES {
        return Err(EngineError::TextTooLarge { len, max: MAX_TEXT_BYTES });
    }
    Ok(())
}

/// Little-endian packs bytes four at a time, padding the final word with
/// zero, matching the shader's `text_byte`/`pattern_byte` unpacking.
fn pack_bytes(bytes: &[u8]) -> Vec<u32> {
    let mut words = Vec::with_capacity(bytes.len().div_ceil(4).max(1));
    for chunk in bytes.chunks(4) {
        let mut word = [0u8; 4];
        word[..chunk.len()].copy_from_slice(chunk);
        words.push(u32::from_le_bytes(word));
    }
    if words.is_empty() {
        words.push(0);
    }
    words
}

pub fn find_matches_literal(
    text: &[u8],
    pattern: &[u8],
    flags: SubstFlags,
) -> Result<Vec<MatchRecord>, EngineError> {
    check_size(text.len())?;
    let ctx = context().ok_or_else(|| EngineError::BackendUnavailable("no compatible GPU adapter".into()))?;

    let max_matches = text.len() as u32 + 1;
    let num_threads = text.len() as u32 + 1;
    let cfg = DeviceConfig::new(text.len() as u32, pattern.len() as u32, 0, flags, max_matches, num_threads);
    let text_words = pack_bytes(text);
    let pattern_words = pack_bytes(pattern);

    let config_buf = upload(&ctx.device, "vsed-literal-config", bytemuck::bytes_of(&cfg), wgpu::BufferUsages::UNIFORM);
    let text_buf = upload(&ctx.device, "vsed-literal-text", bytemuck::cast_slice(&text_words), wgpu::BufferUsages::STORAGE);
    let pattern_buf = upload(&ctx.device, "vsed-literal-pattern", bytemuck::cast_slice(&pattern_words), wgpu::BufferUsages::STORAGE);
    let (results_buf, counters_buf) = alloc_output(&ctx.device, max_matches);

    let layout = ctx.literal_pipeline.get_bind_group_layout(0);
    let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("vsed-literal-bind-group"),
        layout: &layout,
        entries: &[
            wgpu::BindGroupEntry { binding: 0, resource: config_buf.as_entire_binding() },
            wgpu::BindGroupEntry { binding: 1, resource: text_buf.as_entire_binding() },
            wgpu::BindGroupEntry { binding: 2, resource: pattern_buf.as_entire_binding() },
            wgpu::BindGroupEntry { binding: 3, resource: results_buf.as_entire_binding() },
            wgpu::BindGroupEntry { binding: 4, resource: counters_buf.as_entire_binding() },
        ],
    });

    let (starts_ends, total) = dispatch(ctx, &ctx.literal_pipeline, &bind_group, num_threads, &results_buf, &counters_buf, max_matches)?;
    Ok(collapse_for_flags(to_match_records(text, starts_ends, total, max_matches), flags))
}

pub fn find_matches_regex(
    text: &[u8],
    program: &DeviceProgram,
    flags: SubstFlags,
) -> Result<Vec<MatchRecord>, EngineError> {
    check_size(text.len())?;
    let ctx = context().ok_or_else(|| EngineError::BackendUnavailable("no compatible GPU adapter".into()))?;

    let max_matches = text.len() as u32 + 1;
    let num_threads = text.len() as u32 + 1;
    // The NFA start index has nowhere else to live in the shared config
    // record, so it rides in `pattern_len` for the regex kernel only.
    let cfg = DeviceConfig::new(text.len() as u32, program.start, 0, flags, max_matches, num_threads);
    let text_words = pack_bytes(text);
    let states: Vec<[u32; 3]> = program.states.iter().map(|s| [s.kind, s.a, s.b]).collect();
    let bitmaps_flat: Vec<u32> = program.bitmaps.iter().flat_map(|b| b.iter().copied()).collect();
    let bitmaps_flat = if bitmaps_flat.is_empty() { vec![0u32] } else { bitmaps_flat };

    let config_buf = upload(&ctx.device, "vsed-regex-config", bytemuck::bytes_of(&cfg), wgpu::BufferUsages::UNIFORM);
    let text_buf = upload(&ctx.device, "vsed-regex-text", bytemuck::cast_slice(&text_words), wgpu::BufferUsages::STORAGE);
    let states_buf = upload(&ctx.device, "vsed-regex-states", bytemuck::cast_slice(&states), wgpu::BufferUsages::STORAGE);
    let bitmaps_buf = upload(&ctx.device, "vsed-regex-bitmaps", bytemuck::cast_slice(&bitmaps_flat), wgpu::BufferUsages::STORAGE);
    let (results_buf, counters_buf) = alloc_output(&ctx.device, max_matches);

    let layout = ctx.regex_pipeline.get_bind_group_layout(0);
    let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("vsed-regex-bind-group"),
        layout: &layout,
        entries: &[
            wgpu::BindGroupEntry { binding: 0, resource: config_buf.as_entire_binding() },
            wgpu::BindGroupEntry { binding: 1, resource: text_buf.as_entire_binding() },
            wgpu::BindGroupEntry { binding: 3, resource: results_buf.as_entire_binding() },
            wgpu::BindGroupEntry { binding: 4, resource: counters_buf.as_entire_binding() },
            wgpu::BindGroupEntry { binding: 5, resource: states_buf.as_entire_binding() },
            wgpu::BindGroupEntry { binding: 6, resource: bitmaps_buf.as_entire_binding() },
        ],
    });

    let (starts_ends, total) = dispatch(ctx, &ctx.regex_pipeline, &bind_group, num_threads, &results_buf, &counters_buf, max_matches)?;
    Ok(collapse_for_flags(to_match_records(text, starts_ends, total, max_matches), flags))
}

fn upload(device: &wgpu::Device, label: &str, contents: &[u8], usage: wgpu::BufferUsages) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents,
        usage: usage | wgpu::BufferUsages::COPY_DST,
    })
}

fn alloc_output(device: &wgpu::Device, max_matches: u32) -> (wgpu::Buffer, wgpu::Buffer) {
    let results_size = (max_matches as u64).max(1) * std::mem::size_of::<[u32; 2]>() as u64;
    let results_buf = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("vsed-results"),
        size: results_size,
        usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    let counters_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("vsed-counters"),
        contents: bytemuck::cast_slice(&[0u32, 0u32]),
        usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC | wgpu::BufferUsages::COPY_DST,
    });
    (results_buf, counters_buf)
}

const WORKGROUP_SIZE: u32 = 64;

fn dispatch(
    ctx: &GpuContext,
    pipeline: &wgpu::ComputePipeline,
    bind_group: &wgpu::BindGroup,
    num_threads: u32,
    results_buf: &wgpu::Buffer,
    counters_buf: &wgpu::Buffer,
    max_matches: u32,
) -> Result<(Vec<[u32; 2]>, u32), EngineError> {
    let mut encoder = ctx.device.create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("vsed-encoder") });
    {
        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor { label: Some("vsed-pass"), timestamp_writes: None });
        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, bind_group, &[]);
        let groups = num_threads.div_ceil(WORKGROUP_SIZE).max(1);
        pass.dispatch_workgroups(groups, 1, 1);
    }

    let results_size = (max_matches as u64).max(1) * std::mem::size_of::<[u32; 2]>() as u64;
    let results_staging = ctx.device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("vsed-results-staging"),
        size: results_size,
        usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    let counters_staging = ctx.device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("vsed-counters-staging"),
        size: 8,
        usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    encoder.copy_buffer_to_buffer(results_buf, 0, &results_staging, 0, results_size);
    encoder.copy_buffer_to_buffer(counters_buf, 0, &counters_staging, 0, 8);
    ctx.queue.submit(Some(encoder.finish()));

    let (tx, rx) = std::sync::mpsc::channel();
    let counters_slice = counters_staging.slice(..);
    counters_slice.map_async(wgpu::MapMode::Read, move |res| {
        let _ = tx.send(res);
    });
    ctx.device.poll(wgpu::Maintain::Wait);
    rx.recv()
        .map_err(|_| EngineError::BackendUnavailable("device lost while mapping counters".into()))?
        .map_err(|e| EngineError::BackendUnavailable(e.to_string()))?;
    let counters: &[u32] = bytemuck::cast_slice(&counters_slice.get_mapped_range());
    let written = counters[0].min(max_matches);
    let total = counters[1];
    counters_staging.unmap();

    let (tx2, rx2) = std::sync::mpsc::channel();
    let results_slice = results_staging.slice(..);
    results_slice.map_async(wgpu::MapMode::Read, move |res| {
        let _ = tx2.send(res);
    });
    ctx.device.poll(wgpu::Maintain::Wait);
    rx2.recv()
        .map_err(|_| EngineError::BackendUnavailable("device lost while mapping results".into()))?
        .map_err(|e| EngineError::BackendUnavailable(e.to_string()))?;
    let raw: &[[u32; 2]] = bytemuck::cast_slice(&results_slice.get_mapped_range());
    let records = raw[..written as usize].to_vec();
    results_staging.unmap();

    Ok((records, total))
}

/// Sorts device-reported matches by start offset and reconstructs line
/// numbers on the host, the "host-side sort-by-start" step from §4.5.
fn to_match_records(text: &[u8], mut raw: Vec<[u32; 2]>, total: u32, max_matches: u32) -> Vec<MatchRecord> {
    if total > max_matches {
        log::warn!("device reported {total} matches but only {max_matches} slots were reserved; truncating");
    }
    raw.sort_by_key(|m| m[0]);

    let mut out = Vec::with_capacity(raw.len());
    let mut line = 0usize;
    let mut next_nl = memchr::memchr(b'\n', text);
    for [start, end] in raw {
        let start = start as usize;
        while let Some(nl) = next_nl {
            if nl < start {
                line += 1;
                next_nl = memchr::memchr(b'\n', &text[nl + 1..]).map(|i| i + nl + 1);
            } else {
                break;
            }
        }
        out.push(MatchRecord { start, end: end as usize, line });
    }
    out
}

/// Applies the same per-line traversal policy the host matchers enforce
/// sequentially (§4.2/§4.4) to the device's independently-found raw
/// matches: every thread probes its own candidate position in parallel,
/// so without this pass a self-overlapping pattern (or a non-global/
/// first-only command) would report overlapping or extra same-line
/// matches that the host path never would. `records` must already be
/// sorted by start with line numbers assigned (i.e. post
/// [`to_match_records`]), which keeps every same-line run contiguous.
fn collapse_for_flags(records: Vec<MatchRecord>, flags: SubstFlags) -> Vec<MatchRecord> {
    let mut out = Vec::with_capacity(records.len());
    let mut iter = records.into_iter().peekable();
    while let Some(first) = iter.next() {
        let line = first.line;
        let mut last_end = first.end;
        out.push(first);

        if flags.first_only || !flags.global {
            while matches!(iter.peek(), Some(r) if r.line == line) {
                iter.next();
            }
            continue;
        }

        while let Some(r) = iter.peek() {
            if r.line != line {
                break;
            }
            if r.start >= last_end {
                let r = iter.next().unwrap();
                last_end = r.end;
                out.push(r);
            } else {
                iter.next();
            }
        }
    }
    out
}
