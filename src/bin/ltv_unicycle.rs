//
// Figure-eight trajectory tracking with the LTV unicycle controller.
//
// Usage: ltv_unicycle [config.toml]
//
use rand::thread_rng;
use rand_distr::{Distribution, Normal};
use tracing::info;
use tracing_subscriber::EnvFilter;

use ltv_unicycle::utils::{colors, PathStyle, Visualizer};
use ltv_unicycle::{
    ControlResult, ControllerError, LtvUnicycleConfig, LtvUnicycleController, Pose2D,
    TrajectoryState, TrajectoryTracker,
};

const SIM_TIME: f64 = 20.0; // [s]
const SIZE: f64 = 3.0;      // half width of the figure eight [m]
const OMEGA: f64 = 0.3;     // traversal rate [rad/s]

// Lemniscate of Gerono: x = A sin(wt), y = A sin(wt) cos(wt)
fn figure_eight(t: f64) -> TrajectoryState {
    let (s1, c1) = (OMEGA * t).sin_cos();
    let (s2, c2) = (2.0 * OMEGA * t).sin_cos();

    let dx = SIZE * OMEGA * c1;
    let dy = SIZE * OMEGA * c2;
    let ddx = -SIZE * OMEGA * OMEGA * s1;
    let ddy = -2.0 * SIZE * OMEGA * OMEGA * s2;

    let v = (dx * dx + dy * dy).sqrt();
    TrajectoryState {
        time: t,
        velocity: v,
        acceleration: (dx * ddx + dy * ddy) / v,
        pose: Pose2D::new(SIZE * s1, SIZE * s1 * c1, dy.atan2(dx)),
        curvature: (dx * ddy - dy * ddx) / (v * v * v),
    }
}

fn simulate<T: TrajectoryTracker>(tracker: &mut T, start: Pose2D, dt: f64) -> (Vec<Pose2D>, Vec<Pose2D>) {
    let mut pose = start;
    let mut reference = Vec::new();
    let mut tracked = vec![pose];
    let steps = (SIM_TIME / dt) as usize;
    let log_every = ((1.0 / dt) as usize).max(1);

    for i in 0..steps {
        let state = figure_eight(i as f64 * dt);
        let u = tracker.calculate_state(&pose, &state);

        if i % log_every == 0 {
            info!(
                "t = {:5.2} s  cmd = {}  error = {}  at_reference = {}",
                state.time,
                u,
                state.pose.relative_to(&pose),
                tracker.at_reference()
            );
        }

        // unicycle kinematics
        pose = Pose2D::new(
            pose.x + u.v * pose.yaw.cos() * dt,
            pose.y + u.v * pose.yaw.sin() * dt,
            pose.yaw + u.omega * dt,
        );
        pose.normalize_yaw();

        reference.push(state.pose);
        tracked.push(pose);
    }
    (reference, tracked)
}

fn main() -> ControlResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .compact()
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => LtvUnicycleConfig::load(path)?,
        None => LtvUnicycleConfig::default(),
    };
    info!("LTV unicycle simulation start: {:?}", config);

    let mut controller = LtvUnicycleController::from_config(&config)?;
    controller.set_tolerance(Pose2D::new(0.05, 0.05, 0.05));

    // start off the trajectory
    let noise = Normal::new(0.0, 0.2)
        .map_err(|e| ControllerError::InvalidParameter(e.to_string()))?;
    let mut rng = thread_rng();
    let origin = figure_eight(0.0).pose;
    let start = origin.transform_by(&Pose2D::new(
        noise.sample(&mut rng),
        noise.sample(&mut rng),
        noise.sample(&mut rng),
    ));

    let (reference, tracked) = simulate(&mut controller, start, config.dt);

    let last = tracked[tracked.len() - 1];
    info!(
        "final error = {:?}, at_reference = {}",
        controller.pose_error(),
        controller.at_reference()
    );

    std::fs::create_dir_all("./img")?;
    let mut vis = Visualizer::new();
    vis.set_title("LTV Unicycle Controller")
        .plot_poses(&reference, &PathStyle::new(colors::REFERENCE, "Reference").with_line_width(1.0))
        .plot_poses(&tracked, &PathStyle::new(colors::TRACKED, "Tracked"))
        .plot_robot(&last, 0.3);
    vis.save_svg("./img/ltv_unicycle.svg")?;
    info!("saved ./img/ltv_unicycle.svg");

    Ok(())
}
