//! The value object threaded through every simulation stage.

use crate::effort::{EffortCurveMap, TractiveEffortCurve};
use crate::etcs::{BrakingType, EtcsContext};
use crate::path::PhysicsPath;
use crate::rolling_stock::RollingStock;

/// Borrowed, immutable simulation inputs for one train.
///
/// `SimContext` is `Copy` and holds no heap data of its own, so it is passed
/// by value.  Because [`PhysicsPath`] is `Send + Sync`, contexts for
/// different trains can be used from different threads at once.
#[derive(Copy, Clone)]
pub struct SimContext<'a> {
    pub rolling_stock: &'a RollingStock,
    pub path:          &'a dyn PhysicsPath,
    /// Integration time step, s.
    pub time_step:     f64,
    pub effort_curves: &'a EffortCurveMap,
    /// Deceleration policy for braking curves.  Default: `Constant`.
    pub braking_type:  BrakingType,
    /// Ranges where stops and limit decreases get ETCS braking curves.
    pub etcs:          Option<&'a EtcsContext>,
}

impl<'a> SimContext<'a> {
    pub fn new(
        rolling_stock: &'a RollingStock,
        path:          &'a dyn PhysicsPath,
        time_step:     f64,
        effort_curves: &'a EffortCurveMap,
    ) -> Self {
        Self {
            rolling_stock,
            path,
            time_step,
            effort_curves,
            braking_type: BrakingType::Constant,
            etcs: None,
        }
    }

    pub fn with_braking_type(mut self, braking_type: BrakingType) -> Self {
        self.braking_type = braking_type;
        self
    }

    /// Enable ETCS braking curves over `etcs`'s application ranges.  The
    /// rolling stock must carry ETCS brake parameters.
    pub fn with_etcs(mut self, etcs: &'a EtcsContext) -> Self {
        self.etcs = Some(etcs);
        self
    }

    /// Whether `position` gets ETCS braking curves.
    pub fn is_etcs_position(&self, position: f64) -> bool {
        self.etcs.is_some_and(|etcs| etcs.contains(position))
    }

    /// Same train and path with a different effort curve assignment.
    pub fn with_effort_curves(mut self, effort_curves: &'a EffortCurveMap) -> Self {
        self.effort_curves = effort_curves;
        self
    }

    #[inline]
    pub fn path_length(&self) -> f64 {
        self.path.length()
    }

    /// The effort curve active at `position` (clamped to the path).
    ///
    /// # Panics
    /// Panics if no curve covers the position.  Callers build the map over
    /// the whole path; a gap is a bug, not a user error.
    pub fn effort_curve_at(&self, position: f64) -> &'a TractiveEffortCurve {
        let clamped = position.clamp(0.0, self.path.length());
        self.effort_curves
            .get(clamped)
            .unwrap_or_else(|| panic!("no tractive effort curve defined at position {clamped} m"))
    }
}
