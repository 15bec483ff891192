//! Canned TSRs and chain records.

use tsrkit_core::pose::{Pose, pose_from_xyz_rpy};
use tsrkit_core::tsr::{Bounds, Tsr};

/// A TSR with identity frames and symmetric bounds `[-w, w]` per axis.
///
/// # Panics
///
/// Panics if any width is negative or non-finite.
pub fn centered_tsr(half_widths: [f64; 6]) -> Tsr {
    let mut bounds: Bounds = [[0.0; 2]; 6];
    for (pair, w) in bounds.iter_mut().zip(half_widths) {
        *pair = [-w, w];
    }
    Tsr::new(Pose::identity(), Pose::identity(), bounds).expect("valid fixture bounds")
}

/// A TSR that pins the end effector to exactly one pose.
pub fn point_tsr(xyz: [f64; 3], rpy: [f64; 3]) -> Tsr {
    Tsr::new(pose_from_xyz_rpy(xyz, rpy), Pose::identity(), [[0.0; 2]; 6])
        .expect("zero bounds are valid")
}

/// Top grasp of a cylinder standing on a table: free yaw about the axis,
/// a little slack in height, gripper 10 cm above the grasp frame.
pub fn cylinder_grasp_tsr() -> Tsr {
    Tsr::new(
        pose_from_xyz_rpy([0.6, 0.0, 0.75], [0.0, 0.0, 0.0]),
        pose_from_xyz_rpy([0.0, 0.0, 0.1], [0.0, 0.0, 0.0]),
        [
            [0.0, 0.0],
            [0.0, 0.0],
            [-0.02, 0.02],
            [0.0, 0.0],
            [0.0, 0.0],
            [-std::f64::consts::PI, std::f64::consts::PI],
        ],
    )
    .expect("valid fixture bounds")
}

/// Chain text record with the given flags and TSRs.
pub fn chain_record(flags: [bool; 3], tsrs: &[Tsr]) -> String {
    let mut out = format!(
        "{} {} {} {}",
        u8::from(flags[0]),
        u8::from(flags[1]),
        u8::from(flags[2]),
        tsrs.len()
    );
    for tsr in tsrs {
        out.push(' ');
        out.push_str(&tsr.to_string());
    }
    out
}

/// A syntactically complete TSR record whose x bounds are inverted.
pub fn inverted_bounds_record() -> String {
    let identity = "1 0 0 0 1 0 0 0 1 0 0 0";
    format!("0 NULL {identity} {identity} 0.1 -0.1 0 0 0 0 0 0 0 0 0 0")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tsrkit_core::tokens::TokenReader;

    #[test]
    fn fixtures_are_valid() {
        assert_eq!(centered_tsr([0.1; 6]).bounds()[3], [-0.1, 0.1]);
        assert_eq!(point_tsr([1.0, 0.0, 0.0], [0.0; 3]).bounds(), &[[0.0; 2]; 6]);
        assert_eq!(cylinder_grasp_tsr().relative_body(), None);
    }

    #[test]
    fn chain_record_has_header_and_records() {
        let record = chain_record([true, false, true], &[centered_tsr([0.0; 6])]);
        assert!(record.starts_with("1 0 1 1 "));
        assert_eq!(record.split_whitespace().count(), 4 + tsrkit_core::tsr::RECORD_TOKENS);
    }

    #[test]
    fn inverted_record_is_rejected() {
        let text = inverted_bounds_record();
        let mut tokens = TokenReader::new(&text);
        assert!(Tsr::parse(&mut tokens).is_err());
        assert!(tokens.is_empty());
    }
}
