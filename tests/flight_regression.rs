//! End-to-end flight regression and physical sanity checks.

use approx::assert_relative_eq;
use baseball_physics::{
    EnvironmentState, LaunchParams, StepMode, StopReason, TrajectorySimulator,
};

fn simulate(params: &LaunchParams, env: &EnvironmentState, mode: StepMode) -> baseball_physics::TrajectoryRecord {
    TrajectorySimulator::default()
        .simulate_flight(params, env, mode)
        .expect("valid launch")
}

fn reference_launch() -> LaunchParams {
    LaunchParams {
        exit_velo_mph: 100.0,
        launch_angle_deg: 28.0,
        spray_angle_deg: 0.0,
        backspin_rpm: 1800.0,
        sidespin_rpm: 0.0,
        contact_height_ft: 3.0,
    }
}

#[test]
fn reference_drive_carries_about_400_feet() {
    let env = EnvironmentState::new(0.0, 70.0, 50.0);
    let record = simulate(&reference_launch(), &env, StepMode::Fine);

    assert_eq!(record.stop_reason(), StopReason::BoundaryReached);
    let summary = record.summary();
    assert!(
        (summary.carry_distance_ft - 395.0).abs() <= 15.0,
        "carry {} ft outside 395±15",
        summary.carry_distance_ft
    );
    assert!(
        summary.flight_time_s >= 5.5 && summary.flight_time_s <= 6.0,
        "flight time {} s outside 5.5-6.0",
        summary.flight_time_s
    );
    assert!(summary.peak_height_ft > 80.0 && summary.peak_height_ft < 115.0);
    assert!(summary.time_to_peak_s < summary.flight_time_s);
}

#[test]
fn landing_sample_sits_on_the_ground() {
    let env = EnvironmentState::typical();
    let record = simulate(&reference_launch(), &env, StepMode::Fine);
    assert!(record.landing_point().z.abs() < 1e-3);
    // Final sample is descending
    assert!(record.final_state().vel.z < 0.0);
}

#[test]
fn coarse_step_lands_within_a_few_percent_of_fine() {
    let env = EnvironmentState::typical();
    let fine = simulate(&reference_launch(), &env, StepMode::Fine);
    let coarse = simulate(&reference_launch(), &env, StepMode::Coarse);
    let rel = (fine.carry_distance_ft() - coarse.carry_distance_ft()).abs()
        / fine.carry_distance_ft();
    assert!(rel < 0.03, "coarse diverged {:.2}% from fine", rel * 100.0);
}

#[test]
fn simulation_is_pure() {
    let env = EnvironmentState::typical();
    let a = simulate(&reference_launch(), &env, StepMode::Fine);
    let b = simulate(&reference_launch(), &env, StepMode::Fine);
    assert_eq!(a.samples().len(), b.samples().len());
    assert_eq!(a.flight_time_s(), b.flight_time_s());
    assert_eq!(a.landing_point(), b.landing_point());
}

#[test]
fn harder_contact_carries_farther() {
    let env = EnvironmentState::typical();
    let mut prev = 0.0;
    for ev in [85.0, 95.0, 105.0] {
        let record = simulate(
            &LaunchParams {
                exit_velo_mph: ev,
                ..reference_launch()
            },
            &env,
            StepMode::Coarse,
        );
        assert!(record.carry_distance_ft() > prev, "carry not monotone at {ev} mph");
        prev = record.carry_distance_ft();
    }
}

#[test]
fn thin_air_carries_farther() {
    let launch = reference_launch();
    let sea = simulate(&launch, &EnvironmentState::new(0.0, 70.0, 50.0), StepMode::Coarse);
    let denver = simulate(&launch, &EnvironmentState::new(5280.0, 70.0, 50.0), StepMode::Coarse);
    assert!(denver.carry_distance_ft() > sea.carry_distance_ft() + 10.0);
}

#[test]
fn backspin_below_saturation_adds_carry() {
    let env = EnvironmentState::typical();
    let low = simulate(
        &LaunchParams {
            backspin_rpm: 1200.0,
            ..reference_launch()
        },
        &env,
        StepMode::Coarse,
    );
    let high = simulate(
        &LaunchParams {
            backspin_rpm: 1800.0,
            ..reference_launch()
        },
        &env,
        StepMode::Coarse,
    );
    assert!(high.carry_distance_ft() > low.carry_distance_ft());
}

#[test]
fn flight_summary_exports_as_json() {
    let env = EnvironmentState::typical();
    let summary = simulate(&reference_launch(), &env, StepMode::Coarse).summary();
    let json = serde_json::to_string(&summary).expect("summary serializes");
    let back: baseball_physics::FlightSummary =
        serde_json::from_str(&json).expect("summary deserializes");
    assert_eq!(back.carry_distance_ft, summary.carry_distance_ft);
    assert_eq!(back.flight_time_s, summary.flight_time_s);
    assert_eq!(back.stop_reason, summary.stop_reason);
}

#[test]
fn spray_angle_rotates_the_landing_point() {
    let env = EnvironmentState::typical();
    let pulled = simulate(
        &LaunchParams {
            spray_angle_deg: 25.0,
            ..reference_launch()
        },
        &env,
        StepMode::Coarse,
    );
    let summary = pulled.summary();
    assert_relative_eq!(summary.landing_spray_angle_deg, 25.0, epsilon = 3.0);
    assert!(summary.landing_y_ft > 0.0);
}
