use image::ImageOutputFormat;
use laser_anchor::{
    EmptyEnvironment, Environment, FrameInput, FrameOutcome, LaserPointerTracker,
    PlaneEnvironment, TrackerSettings,
};
use laser_cli::{render_detection, rgba_buffer, RowMajor};
use laser_core::nalgebra::{Point2, Vector2};
use laser_detect::{centered_roi, PixelLayout};
use laser_pinhole::{CameraIntrinsics, CameraIntrinsicsK1Distortion, Intrinsics};
use log::*;
use std::path::PathBuf;
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "laserdetect",
    about = "A tool to find a laser pointer dot in an image and anchor it in world space"
)]
struct Opt {
    /// The file where settings are specified.
    ///
    /// This is in the format of `laser_anchor::TrackerSettings`.
    #[structopt(short, long, default_value = "laser-settings.json")]
    settings: PathBuf,
    /// A JSON file of planes to raycast against, in the format of `laser_anchor::PlaneEnvironment`.
    ///
    /// Without it, the anchor is always placed at the fallback distance.
    #[structopt(short, long, parse(from_os_str))]
    environment: Option<PathBuf>,
    /// Camera-to-world matrix as 16 row-major values.
    #[structopt(long, default_value = "1,0,0,0,0,1,0,0,0,0,1,0,0,0,0,1")]
    pose: RowMajor,
    /// Projection matrix as 16 row-major values.
    #[structopt(
        long,
        default_value = "2.31029,0,0.09614,0,0,4.10427,-0.06231,0,0,0,-1,0,0,0,-1,0"
    )]
    projection: RowMajor,
    /// The x focal length in pixels. Providing it unprojects with intrinsics instead of the
    /// projection matrix.
    #[structopt(long)]
    x_focal: Option<f64>,
    /// The y focal length, defaults to the x focal length
    #[structopt(long)]
    y_focal: Option<f64>,
    /// The x optical center coordinate, defaults to the image center
    #[structopt(long)]
    x_center: Option<f64>,
    /// The y optical center coordinate, defaults to the image center
    #[structopt(long)]
    y_center: Option<f64>,
    /// The skew
    #[structopt(long, default_value = "0.0")]
    skew: f64,
    /// The K1 radial distortion
    #[structopt(long, default_value = "0.0")]
    radial_distortion: f64,
    /// Write an image showing the search region and the marker here (autodetects image type
    /// from extension).
    ///
    /// Use `-` to write a PNG to stdout.
    #[structopt(short, long, parse(from_os_str))]
    output: Option<PathBuf>,
    /// The image file to search.
    #[structopt(parse(from_os_str))]
    input: PathBuf,
}

impl Opt {
    fn intrinsics(&self, width: u32, height: u32) -> Option<Intrinsics> {
        let x_focal = self.x_focal?;
        let simple = CameraIntrinsics {
            focals: Vector2::new(x_focal, self.y_focal.unwrap_or(x_focal)),
            principal_point: Point2::new(
                self.x_center.unwrap_or(f64::from(width) / 2.0),
                self.y_center.unwrap_or(f64::from(height) / 2.0),
            ),
            skew: self.skew,
        };
        Some(if self.radial_distortion == 0.0 {
            simple.into()
        } else {
            CameraIntrinsicsK1Distortion::new(simple, self.radial_distortion).into()
        })
    }
}

fn main() {
    pretty_env_logger::init_timed();
    let opt = Opt::from_args();

    let settings = std::fs::File::open(&opt.settings)
        .ok()
        .and_then(|file| serde_json::from_reader(file).ok());
    if settings.is_some() {
        info!("loaded existing settings");
    } else {
        info!("used default settings");
    }
    let settings: TrackerSettings = settings.unwrap_or_default();

    let environment: Box<dyn Environment> = match &opt.environment {
        Some(path) => {
            let file = std::fs::File::open(path).expect("failed to open environment file");
            let planes: PlaneEnvironment =
                serde_json::from_reader(file).expect("failed to parse environment file");
            info!("loaded {} planes", planes.planes.len());
            Box::new(planes)
        }
        None => Box::new(EmptyEnvironment),
    };

    let image = image::open(&opt.input).expect("failed to open image file");
    let (data, width, height) = rgba_buffer(&image);
    let mut input = FrameInput::new(&data, width, height, PixelLayout::Rgba8, &opt.pose.0)
        .projection(&opt.projection.0);
    if let Some(intrinsics) = opt.intrinsics(width, height) {
        input = input.intrinsics(intrinsics);
    }

    let mut tracker = LaserPointerTracker::new(settings).expect("invalid settings");
    let resolved = tracker.process_and_resolve(&input, &*environment);
    info!("processed frame in {:?}", tracker.stats().last_duration);

    match (&resolved.outcome, resolved.anchor) {
        (_, Some(anchor)) => {
            let [x, y, z] = anchor.world_point();
            println!(
                "marker at pixel ({}, {}), world ({:.3}, {:.3}, {:.3}), {:.2} m{}",
                anchor.pixel.x,
                anchor.pixel.y,
                x,
                y,
                z,
                anchor.distance,
                if anchor.hit { "" } else { " (no surface hit)" }
            );
        }
        (FrameOutcome::Skipped(reason), None) => println!("frame skipped: {}", reason),
        (_, None) => println!("no marker found"),
    }

    if let Some(path) = opt.output {
        let roi = centered_roi(width, height, settings.detection_area);
        let rendered = render_detection(&image, roi, resolved.anchor.map(|anchor| anchor.pixel));
        if path.as_os_str() == "-" {
            let mut buffer = std::io::Cursor::new(Vec::new());
            rendered
                .write_to(&mut buffer, ImageOutputFormat::Png)
                .expect("failed to write image to stdout");
            std::io::Write::write_all(&mut std::io::stdout().lock(), buffer.get_ref())
                .expect("failed to write image to stdout");
        } else {
            rendered.save(path).expect("failed to write image");
        }
    }
}
