//! Standard parameter and group names.

pub const HIT_AREA_PREFIX: &str = "HitArea";
pub const HIT_AREA_HEAD: &str = "Head";
pub const HIT_AREA_BODY: &str = "Body";

pub const PARTS_ID_CORE: &str = "Parts01Core";
pub const PARTS_ARM_PREFIX: &str = "Parts01Arm_";
pub const PARTS_ARM_L_PREFIX: &str = "Parts01ArmL_";
pub const PARTS_ARM_R_PREFIX: &str = "Parts01ArmR_";

pub const PARAM_ANGLE_X: &str = "ParamAngleX";
pub const PARAM_ANGLE_Y: &str = "ParamAngleY";
pub const PARAM_ANGLE_Z: &str = "ParamAngleZ";
pub const PARAM_EYE_L_OPEN: &str = "ParamEyeLOpen";
pub const PARAM_EYE_L_SMILE: &str = "ParamEyeLSmile";
pub const PARAM_EYE_R_OPEN: &str = "ParamEyeROpen";
pub const PARAM_EYE_R_SMILE: &str = "ParamEyeRSmile";
pub const PARAM_EYE_BALL_X: &str = "ParamEyeBallX";
pub const PARAM_EYE_BALL_Y: &str = "ParamEyeBallY";
pub const PARAM_BROW_L_Y: &str = "ParamBrowLY";
pub const PARAM_BROW_R_Y: &str = "ParamBrowRY";
pub const PARAM_MOUTH_FORM: &str = "ParamMouthForm";
pub const PARAM_MOUTH_OPEN_Y: &str = "ParamMouthOpenY";
pub const PARAM_CHEEK: &str = "ParamCheek";
pub const PARAM_BODY_ANGLE_X: &str = "ParamBodyAngleX";
pub const PARAM_BODY_ANGLE_Y: &str = "ParamBodyAngleY";
pub const PARAM_BODY_ANGLE_Z: &str = "ParamBodyAngleZ";
pub const PARAM_BREATH: &str = "ParamBreath";
pub const PARAM_HAIR_FRONT: &str = "ParamHairFront";
pub const PARAM_HAIR_SIDE: &str = "ParamHairSide";
pub const PARAM_HAIR_BACK: &str = "ParamHairBack";

/// Model-curve and group names.
pub const EYE_BLINK: &str = "EyeBlink";
pub const LIP_SYNC: &str = "LipSync";
pub const OPACITY: &str = "Opacity";

/// Interned up front by [`IdManager::preload_standard_ids`](crate::utils::interner::IdManager::preload_standard_ids).
pub const STANDARD_IDS: &[&str] = &[
    PARAM_ANGLE_X,
    PARAM_ANGLE_Y,
    PARAM_ANGLE_Z,
    PARAM_EYE_L_OPEN,
    PARAM_EYE_L_SMILE,
    PARAM_EYE_R_OPEN,
    PARAM_EYE_R_SMILE,
    PARAM_EYE_BALL_X,
    PARAM_EYE_BALL_Y,
    PARAM_BROW_L_Y,
    PARAM_BROW_R_Y,
    PARAM_MOUTH_FORM,
    PARAM_MOUTH_OPEN_Y,
    PARAM_CHEEK,
    PARAM_BODY_ANGLE_X,
    PARAM_BODY_ANGLE_Y,
    PARAM_BODY_ANGLE_Z,
    PARAM_BREATH,
    PARAM_HAIR_FRONT,
    PARAM_HAIR_SIDE,
    PARAM_HAIR_BACK,
    EYE_BLINK,
    LIP_SYNC,
    OPACITY,
];
