use anyhow::{anyhow, Context, Result};
use canvas::{RasterCanvas, CANVAS_SIZE};
use dispatch::Dispatcher;
use error::Error;
use indicatif::{ProgressBar, ProgressStyle};
use render::Style;
use std::{
    fs::File,
    io::{self, BufRead, BufReader},
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};
use structopt::StructOpt;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;

mod canvas;
mod dispatch;
mod error;
mod ingest;
mod parse;
mod pose;
mod render;
mod skeleton;

#[derive(structopt::StructOpt)]
struct Opt {
    /// Newline-delimited JSON inference results. Reads stdin when omitted.
    ///
    /// Ctrl-C takes effect once the next line (or end of input) arrives; an
    /// idle stdin keeps waiting until then.
    input: Option<PathBuf>,

    /// Number of events that may wait between ingest and rendering.
    #[structopt(short, long, default_value = "20")]
    queue_size: usize,

    /// Pose keypoint score threshold.
    #[structopt(short, long, default_value = "10")]
    threshold: u16,

    /// Write both canvases here as PPM images once the input is exhausted.
    #[structopt(short, long)]
    output_dir: Option<PathBuf>,

    #[structopt(short, long, default_value = "info", env = "RUST_LOG")]
    log_level: tracing_subscriber::filter::EnvFilter,

    #[structopt(short, long)]
    show_progress: bool,
}

fn open_input(input: Option<&PathBuf>) -> Result<Box<dyn BufRead + Send>> {
    Ok(match input {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("failed to open {:?}", path))?,
        )),
        None => Box::new(BufReader::new(io::stdin())),
    })
}

fn main() -> Result<()> {
    let opt = Opt::from_args();

    tracing::subscriber::set_global_default(
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
            .with(opt.log_level),
    )?;

    let style = Style::default().with_threshold(opt.threshold);
    let canvases = dispatch::shared(
        RasterCanvas::new(CANVAS_SIZE, CANVAS_SIZE, style.background),
        RasterCanvas::new(CANVAS_SIZE, CANVAS_SIZE, style.idle),
    );

    let running = Arc::new(AtomicBool::new(true));
    let running_ctrl_c = running.clone();

    ctrlc::set_handler(move || {
        running_ctrl_c.store(false, Ordering::SeqCst);
    })
    .context("failed setting Ctrl-C handler")?;

    let reader = open_input(opt.input.as_ref())?;

    let progress = if opt.show_progress {
        Some(
            ProgressBar::new_spinner().with_style(
                ProgressStyle::default_spinner()
                    .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
                    .template("{prefix:.bold.dim} {spinner} {wide_msg}"),
            ),
        )
    } else {
        None
    };

    let (events_tx, events_rx) = crossbeam::channel::bounded(opt.queue_size);
    let mut dispatcher = Dispatcher::new(canvases.clone(), style);

    info!(
        message = "starting pipeline",
        queue_size = opt.queue_size,
        threshold = opt.threshold
    );

    let (lines, counts) = crossbeam::thread::scope(|scope| {
        let running_ingest = running.clone();
        let producer = scope.spawn(move |_| {
            // dropping the sender on return lets the consumer drain and stop
            ingest::ingest(reader, &events_tx, &running_ingest).context("failed ingesting frames")
        });

        let consumer = scope.spawn(move |_| {
            let counts = dispatcher.run(&events_rx, progress.as_ref());
            if let Some(progress) = progress {
                progress.finish_and_clear();
            }
            counts
        });

        let lines = producer
            .join()
            .map_err(|_| anyhow!("ingest thread panicked"))??;
        let counts = consumer
            .join()
            .map_err(|_| anyhow!("render thread panicked"))?;
        Ok::<_, anyhow::Error>((lines, counts))
    })
    .map_err(|_| anyhow!("pipeline thread panicked"))??;

    info!(
        message = "input finished",
        lines,
        images = counts.images,
        boxes = counts.boxes,
        frames = counts.frames,
        people = counts.people
    );

    if let Some(dir) = opt.output_dir.as_ref() {
        std::fs::create_dir_all(dir).map_err(|e| Error::CreateOutputDir(e, dir.clone()))?;
        let canvases = dispatch::lock(&canvases);
        canvases.primary.write_ppm(dir.join("primary.ppm"))?;
        canvases.secondary.write_ppm(dir.join("secondary.ppm"))?;
        info!(message = "wrote canvases", dir = ?dir);
    }

    Ok(())
}
