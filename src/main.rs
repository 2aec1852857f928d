use clap::Parser as ClapParser;
use objkit_obj::{debug_print, Heap, HeapConfig, Obj, ObjResult};
use std::io::Write;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let opt = Opt::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut config = HeapConfig::new();
    if let Some(n) = opt.max_bytes {
        config = config.with_max_bytes(n);
    }
    if let Some(n) = opt.max_allocations {
        config = config.with_max_allocations(n);
    }
    let heap = Heap::with_config(config);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    let sample = build_sample(&heap)?;
    debug_print(&sample, &mut out)?;
    writeln!(out)?;

    if opt.shared {
        let second = sample.acquire();
        tracing::info!(owners = second.ref_count(), "sample acquired");
        let after = sample.release();
        writeln!(out, "first release: {:?}", after)?;
        debug_print(&second, &mut out)?;
        writeln!(out)?;
        writeln!(out, "second release: {:?}", second.release())?;
    } else {
        writeln!(out, "release: {:?}", sample.release())?;
    }

    if opt.depth > 0 {
        let nested = build_nested(&heap, opt.depth)?;
        debug_print(&nested, &mut out)?;
        writeln!(out)?;
        tracing::info!(live = heap.stats().live_allocations, "nested vectors built");
        nested.release();
    }

    let stats = heap.stats();
    writeln!(out, "{:#?}", stats)?;
    if stats.live_allocations != 0 {
        return Err(format!("{} allocations were leaked", stats.live_allocations).into());
    }
    Ok(())
}

/// Builds `(3, LEN: {2} ["a", "b"])`.
fn build_sample(heap: &Heap) -> ObjResult<Obj> {
    let v = heap.create_vector(2)?;
    if let Some(items) = v.as_vector() {
        items.push_back(heap.create_string("a")?)?;
        items.push_back(heap.create_string("b")?)?;
    }
    Ok(heap.create_tuple(Some(heap.create_int(3)?), Some(v))?)
}

/// Builds `depth` vectors, each holding its depth and the previous vector.
fn build_nested(heap: &Heap, depth: u32) -> ObjResult<Obj> {
    let mut current = heap.create_vector(1)?;
    for i in 0..depth {
        let parent = heap.create_vector(2)?;
        if let Some(v) = parent.as_vector() {
            v.push_back(heap.create_float(i as f32 * 0.5)?)?;
            v.push_back(current)?;
        }
        current = parent;
    }
    Ok(current)
}

#[derive(clap::Parser)]
#[clap(about, version, author)]
struct Opt {
    /// Refuse allocations once this many bytes are live.
    #[clap(long)]
    max_bytes: Option<usize>,

    /// Refuse allocations once this many registrations are live.
    #[clap(long)]
    max_allocations: Option<usize>,

    /// Acquire a second owner of the sample and release both in turn.
    #[clap(long)]
    shared: bool,

    /// Also build and release this many nested vectors.
    #[clap(short, long, default_value = "0")]
    depth: u32,
}
