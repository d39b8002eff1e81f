use crate::StepHasher;

#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub enum StepStage {
    StepListeners = 1,
    UpdateAabbsPre = 2,
    BroadphaseSap = 3,
    Narrowphase = 4,
    Integrate = 5,
    SolvePositions = 6,
    UpdateVelocities = 7,
    SolveVelocities = 8,
    Sleep = 9,
    UpdateAabbsPost = 10,
}

pub fn schedule_digest(stages: &[StepStage]) -> [u8; 32] {
    let mut h = StepHasher::new();
    for s in stages { h.update_bytes(&[*s as u8]); }
    h.finalize()
}
