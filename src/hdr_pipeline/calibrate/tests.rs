use super::*;
use crate::hdr_pipeline::common::CalibrationError;
use crate::hdr_pipeline::image::synthetic::{
    photograph, ramp_scene, true_log_response, uniform_image, window_scene, BRACKET_TIMES,
};
use crate::hdr_pipeline::image::ExposureStack;

fn calibrator() -> DebevecCalibrator {
    DebevecCalibrator::new(CalibrationConfig::default())
}

#[test]
fn recovers_gamma_response_from_ramp() {
    let stack = photograph(&ramp_scene(64, 48), &BRACKET_TIMES);
    let response = calibrator().calibrate(&stack).unwrap();

    for channel in 0..3 {
        assert!(response.log_exposure(channel, 128).abs() < 1e-3);
        for z in 64..=192u8 {
            let recovered = response.log_exposure(channel, z).exp();
            let truth = true_log_response(z).exp();
            let err = (recovered - truth).abs() / truth;
            assert!(err < 0.05, "channel {channel}, z = {z}: relative error {err}");
        }
    }
}

#[test]
fn recovered_curve_increases_over_observed_range() {
    let stack = photograph(&ramp_scene(64, 48), &BRACKET_TIMES);
    let response = calibrator().calibrate(&stack).unwrap();
    for channel in 0..3 {
        let curve = response.curve(channel);
        assert!(curve[40..=220].windows(2).all(|w| w[1] >= w[0]), "channel {channel}");
    }
}

#[test]
fn two_exposures_are_enough() {
    let stack = photograph(&ramp_scene(48, 32), &[0.5, 2.0]);
    let response = calibrator().calibrate(&stack).unwrap();
    assert!(response.log_exposure(0, 128).abs() < 1e-3);
    assert!(response.log_exposure(0, 200) > response.log_exposure(0, 60));
}

#[test]
fn ignores_samples_clipped_in_every_exposure() {
    let stack = photograph(&window_scene(64, 48), &BRACKET_TIMES);
    assert!(stack.images()[0].data.contains(&255));
    let response = calibrator().calibrate(&stack).unwrap();
    for channel in 0..3 {
        assert!(response.curve(channel).iter().all(|g| g.is_finite()));
    }
}

#[test]
fn uniform_stack_is_rejected() {
    let stack = ExposureStack::new(vec![
        uniform_image(16, 16, 128, 0.5),
        uniform_image(16, 16, 128, 1.0),
        uniform_image(16, 16, 128, 2.0),
    ])
    .unwrap();
    let err = calibrator().calibrate(&stack).unwrap_err();
    assert!(matches!(
        err,
        CalibrationError::InsufficientSamples { channel: 0, distinct: 1, required: 2 }
    ));
}

#[test]
fn fully_clipped_stack_is_rejected() {
    let stack = ExposureStack::new(vec![uniform_image(8, 8, 0, 1.0), uniform_image(8, 8, 255, 2.0)]).unwrap();
    let err = calibrator().calibrate(&stack).unwrap_err();
    assert!(matches!(err, CalibrationError::InsufficientSamples { distinct: 0, .. }));
}

#[test]
fn custom_reference_value_is_pinned() {
    let config = CalibrationConfig {
        reference_value: 100,
        ..CalibrationConfig::default()
    };
    let stack = photograph(&ramp_scene(64, 48), &BRACKET_TIMES);
    let response = DebevecCalibrator::new(config).calibrate(&stack).unwrap();
    assert!(response.log_exposure(1, 100).abs() < 1e-3);
}

#[test]
fn response_rejects_non_finite_curves() {
    let mut curves = [[0.0f32; 256]; 3];
    curves[2][7] = f32::NAN;
    let err = CameraResponse::from_curves(curves).unwrap_err();
    assert!(matches!(err, CalibrationError::NonFinite { channel: 2 }));
}
