use crate::bitmask_flags::BitmaskFlags;

// Bit positions follow the conventional pair-flag layout; hosts write these bits directly
// into `word2`, so the declaration order is a wire format.
crate::define_bitmask_flags!(PairFlag, u32, {
    SolveContact,
    ModifyContacts,
    NotifyTouchFound,
    NotifyTouchPersists,
    NotifyTouchLost,
    NotifyTouchCcd,
    NotifyThresholdForceFound,
    NotifyThresholdForcePersists,
    NotifyThresholdForceLost,
    NotifyContactPoints,
    DetectDiscreteContact,
    DetectCcdContact,
    PreSolverVelocity,
    PostSolverVelocity,
    ContactEventPose,
});

/// Set of [`PairFlag`]s describing how a shape pair is processed and which events it raises.
pub type PairFlags = BitmaskFlags<u32>;

const fn bit(flag: PairFlag) -> u32 {
    1 << (flag as u8)
}

impl BitmaskFlags<u32> {
    /// Resolve contacts and run discrete contact detection.
    pub const CONTACT_DEFAULT: Self = Self::new(
        bit(PairFlag::SolveContact) | bit(PairFlag::DetectDiscreteContact),
    );

    /// Report overlap begin/end and run discrete detection. Trigger pairs never solve.
    pub const TRIGGER_DEFAULT: Self = Self::new(
        bit(PairFlag::NotifyTouchFound)
            | bit(PairFlag::NotifyTouchLost)
            | bit(PairFlag::DetectDiscreteContact),
    );

    /// Notifications a contact pair may request through `word2`.
    pub const CONTACT_NOTIFY: Self = Self::new(
        bit(PairFlag::NotifyTouchFound)
            | bit(PairFlag::NotifyTouchLost)
            | bit(PairFlag::NotifyTouchPersists)
            | bit(PairFlag::NotifyContactPoints),
    );

    pub const TOUCH_FOUND: Self = Self::new(bit(PairFlag::NotifyTouchFound));
    pub const TOUCH_PERSISTS: Self = Self::new(bit(PairFlag::NotifyTouchPersists));
    pub const TOUCH_LOST: Self = Self::new(bit(PairFlag::NotifyTouchLost));
    pub const TOUCH_CCD: Self = Self::new(bit(PairFlag::NotifyTouchCcd));
    pub const CONTACT_POINTS: Self = Self::new(bit(PairFlag::NotifyContactPoints));
}
