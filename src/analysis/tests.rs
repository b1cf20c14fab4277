use super::*;

fn ramp(len: usize) -> Segment {
    Segment::new(
        (0..len)
            .map(|i| Sample::new(i as f64 * 0.25, (i as f64).sin()))
            .collect(),
    )
}

#[test]
fn test_segment_columns() {
    let segment = ramp(4);
    assert_eq!(segment.len(), 4);
    assert!(!segment.is_empty());
    assert_eq!(segment.time(), &[0.0, 0.25, 0.5, 0.75]);
    assert_eq!(segment.velocity()[1], 1.0_f64.sin());

    let samples: Vec<Sample> = segment.samples().collect();
    assert_eq!(samples[2], Sample::new(0.5, 2.0_f64.sin()));
}

#[test]
fn test_validate_accepts_minimum_length() {
    assert!(ramp(MIN_SEGMENT_LEN).validate().is_ok());
}

#[test]
fn test_validate_rejects_short_segment() {
    let err = ramp(MIN_SEGMENT_LEN - 1).validate().unwrap_err();
    assert_eq!(
        err,
        DetectionError::SegmentTooShort {
            required: MIN_SEGMENT_LEN,
            actual: MIN_SEGMENT_LEN - 1
        }
    );
}

#[test]
fn test_validate_rejects_non_increasing_time() {
    let mut time: Vec<f64> = (0..300).map(f64::from).collect();
    time[120] = time[119];
    let segment = Segment::from_columns(time, vec![0.0; 300]);
    assert_eq!(
        segment.validate().unwrap_err(),
        DetectionError::NonIncreasingTime { index: 120 }
    );
}

#[test]
fn test_validate_rejects_non_finite_values() {
    let mut velocity = vec![0.0; 300];
    velocity[7] = f64::NAN;
    let time = (0..300).map(f64::from).collect();
    let segment = Segment::from_columns(time, velocity);
    assert_eq!(
        segment.validate().unwrap_err(),
        DetectionError::NonFiniteSample { index: 7 }
    );
}

#[test]
fn test_segment_wire_format_is_pairs() {
    let segment: Segment = serde_json::from_str("[[0.0, 1.5], [0.5, -2.0]]").unwrap();
    assert_eq!(segment.time(), &[0.0, 0.5]);
    assert_eq!(segment.velocity(), &[1.5, -2.0]);

    let json = serde_json::to_string(&segment).unwrap();
    assert_eq!(json, "[[0.0,1.5],[0.5,-2.0]]");
}

#[test]
fn test_detection_result_wire_format() {
    let negative = serde_json::to_string(&DetectionResult::not_detected()).unwrap();
    assert_eq!(negative, "[false,-1.0]");

    let positive = serde_json::to_string(&DetectionResult::detected_at(42.5)).unwrap();
    assert_eq!(positive, "[true,42.5]");
}

#[test]
fn test_negative_result_always_carries_sentinel() {
    // A negative tuple with a stray onset is normalized on the way in
    let result: DetectionResult = serde_json::from_str("[false, 12.0]").unwrap();
    assert_eq!(result, DetectionResult::not_detected());
    assert_eq!(result.onset_time, NO_ONSET);
    assert_eq!(DetectionResult::detected_at(3.0).onset(), Some(3.0));
}
