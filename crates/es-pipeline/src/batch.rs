//! Many independent trains over one path.
//!
//! Each train runs the whole pipeline (MRSP, braking curves, max effort) on
//! its own; nothing is shared but the read-only path.  With the `parallel`
//! Cargo feature the trains run on Rayon's thread pool.  Results come back
//! in job order either way.

use es_core::{
    BrakingType, EffortCurveMap, EnvelopeSimConfig, EtcsContext, PhysicsPath, RollingStock,
    SimContext,
};
use es_envelope::Envelope;

use crate::max_effort::max_effort_envelope;
use crate::max_speed::max_speed_envelope;
use crate::mrsp::{SpeedLimit, build_mrsp};
use crate::PipelineResult;

/// Inputs for one train.
#[derive(Clone, Debug)]
pub struct TrainJob<'a> {
    pub rolling_stock: &'a RollingStock,
    pub effort_curves: &'a EffortCurveMap,
    pub speed_limits:  Vec<SpeedLimit>,
    /// Stop positions, m.
    pub stops:         Vec<f64>,
    pub initial_speed: f64,
    pub braking_type:  BrakingType,
    /// ETCS application ranges, if any.
    pub etcs:          Option<&'a EtcsContext>,
}

impl<'a> TrainJob<'a> {
    pub fn new(rolling_stock: &'a RollingStock, effort_curves: &'a EffortCurveMap) -> Self {
        Self {
            rolling_stock,
            effort_curves,
            speed_limits: Vec::new(),
            stops: Vec::new(),
            initial_speed: 0.0,
            braking_type: BrakingType::Constant,
            etcs: None,
        }
    }

    pub fn with_speed_limits(mut self, speed_limits: Vec<SpeedLimit>) -> Self {
        self.speed_limits = speed_limits;
        self
    }

    pub fn with_stops(mut self, stops: Vec<f64>) -> Self {
        self.stops = stops;
        self
    }

    pub fn with_initial_speed(mut self, initial_speed: f64) -> Self {
        self.initial_speed = initial_speed;
        self
    }

    pub fn with_braking_type(mut self, braking_type: BrakingType) -> Self {
        self.braking_type = braking_type;
        self
    }

    pub fn with_etcs(mut self, etcs: &'a EtcsContext) -> Self {
        self.etcs = Some(etcs);
        self
    }
}

/// Max effort envelope of one train.
pub fn run_train(
    path:   &dyn PhysicsPath,
    config: &EnvelopeSimConfig,
    job:    &TrainJob<'_>,
) -> PipelineResult<Envelope> {
    config.validate()?;
    job.rolling_stock.validate()?;
    let mut ctx = SimContext::new(job.rolling_stock, path, config.time_step, job.effort_curves)
        .with_braking_type(job.braking_type);
    if let Some(etcs) = job.etcs {
        ctx = ctx.with_etcs(etcs);
    }
    let mrsp = build_mrsp(path.length(), job.rolling_stock.max_speed, &job.speed_limits)?;
    let max_speed = max_speed_envelope(&ctx, &job.stops, &mrsp)?;
    max_effort_envelope(&ctx, job.initial_speed, &max_speed)
}

/// Max effort envelopes of every job, in job order.
pub fn run_batch(
    path:   &dyn PhysicsPath,
    config: &EnvelopeSimConfig,
    jobs:   &[TrainJob<'_>],
) -> Vec<PipelineResult<Envelope>> {
    log::debug!("running {} trains over {} m", jobs.len(), path.length());

    #[cfg(not(feature = "parallel"))]
    {
        jobs.iter().map(|job| run_train(path, config, job)).collect()
    }

    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;

        jobs.par_iter().map(|job| run_train(path, config, job)).collect()
    }
}
