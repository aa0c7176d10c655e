//! The workspace: one isolated construction-and-discovery run over a set
//! of trails. Stages run in order and commit only on completion, so a
//! failed or cancelled stage leaves the previously committed results
//! untouched.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::info;
use measure_time::info_time;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::candidate::RouteCandidate;
use crate::config::EngineConfig;
use crate::error::StageError;
use crate::generate::{discover_routes, GeneratorContext};
use crate::network::{build_network, Network};
use crate::oracle::NetworkOracle;
use crate::pattern::RoutePattern;
use crate::split::{split_trails, IntersectionPoint, SplitOutcome};
use crate::trail::{Trail, TrailId, TrailSegment};

/// The three pipeline stages, in their only legal order.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[strum(serialize_all = "kebab-case")]
pub enum Stage {
    Split,
    Build,
    Discover,
}

/// Cooperative cancellation flag, checked at stage checkpoints. Cloning
/// shares the flag.
#[derive(Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        CancelToken::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Counters accumulated across one run, for reporting. Recoverable
/// events (skipped trails, unreachable queries, exhausted searches) are
/// counted here rather than failing the run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub stages_completed: Vec<Stage>,

    pub trails_in: usize,
    pub trails_skipped: usize,
    pub intersections: usize,
    pub segments: usize,
    pub dropped_segments: usize,

    pub nodes: usize,
    pub edges: usize,
    pub rejected_edges: usize,

    pub anchors_explored: usize,
    pub unreachable_queries: usize,
    pub exhausted_searches: usize,
    pub pattern_rejections: usize,
    pub overlap_rejections: usize,
    pub routes: usize,
}

/// One isolated run over a trail set. Workspaces never share state; two
/// workspaces over the same trails are fully independent.
pub struct Workspace {
    config: EngineConfig,
    trails: Vec<Trail>,
    cancel: CancelToken,

    split: Option<SplitOutcome>,
    network: Option<Network>,
    routes: Vec<RouteCandidate>,

    completed: Vec<Stage>,
    summary: RunSummary,
}

impl Workspace {
    pub fn new(trails: Vec<Trail>, config: EngineConfig) -> Self {
        let summary = RunSummary {
            started_at: Some(Utc::now()),
            trails_in: trails.len(),
            ..RunSummary::default()
        };

        Workspace {
            config,
            trails,
            cancel: CancelToken::new(),
            split: None,
            network: None,
            routes: Vec::new(),
            completed: Vec::new(),
            summary,
        }
    }

    /// A handle another thread can use to cancel this run at the next
    /// stage checkpoint.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    pub fn trails(&self) -> &[Trail] {
        &self.trails
    }

    pub fn intersections(&self) -> &[IntersectionPoint] {
        self.split
            .as_ref()
            .map(|outcome| outcome.intersections.as_slice())
            .unwrap_or(&[])
    }

    pub fn segments(&self) -> &[TrailSegment] {
        self.split
            .as_ref()
            .map(|outcome| outcome.segments.as_slice())
            .unwrap_or(&[])
    }

    pub fn network(&self) -> Option<&Network> {
        self.network.as_ref()
    }

    pub fn routes(&self) -> &[RouteCandidate] {
        &self.routes
    }

    /// Runs all three stages in order.
    pub fn run(&mut self, pattern: &RoutePattern) -> crate::Result<&[RouteCandidate]> {
        self.split()?;
        self.build()?;
        self.discover(pattern)
    }

    /// Stage one: intersection detection and trail splitting.
    pub fn split(&mut self) -> crate::Result<&SplitOutcome> {
        self.checkpoint(Stage::Split)?;
        info_time!("stage {}", Stage::Split);

        let outcome = split_trails(&self.trails, &self.config.split);

        self.summary.trails_skipped = outcome.skipped.len();
        self.summary.intersections = outcome.intersections.len();
        self.summary.segments = outcome.segments.len();
        self.summary.dropped_segments = outcome.dropped_segments;

        self.commit(Stage::Split);
        Ok(self.split.insert(outcome))
    }

    /// Stage two: node deduplication and edge emission.
    pub fn build(&mut self) -> crate::Result<&Network> {
        self.require(Stage::Build, Stage::Split)?;
        self.checkpoint(Stage::Build)?;
        info_time!("stage {}", Stage::Build);

        let segments = self
            .split
            .as_ref()
            .map(|outcome| outcome.segments.as_slice())
            .unwrap_or(&[]);

        let network = build_network(segments, &self.config.network);
        if network.node_count() == 0 {
            return Err(StageError::EmptyNetwork.into());
        }

        self.summary.nodes = network.node_count();
        self.summary.edges = network.edge_count();
        self.summary.rejected_edges = network.rejected_edges();

        self.commit(Stage::Build);
        Ok(self.network.insert(network))
    }

    /// Stage three: route discovery against a pattern.
    pub fn discover(&mut self, pattern: &RoutePattern) -> crate::Result<&[RouteCandidate]> {
        self.require(Stage::Discover, Stage::Build)?;
        self.checkpoint(Stage::Discover)?;
        info_time!("stage {}", Stage::Discover);

        let network = match self.network.as_ref() {
            Some(network) => network,
            None => return Err(StageError::EmptyNetwork.into()),
        };

        let oracle = NetworkOracle::new(network);
        let output = discover_routes(&GeneratorContext {
            network,
            oracle: &oracle,
            pattern,
            config: &self.config.search,
        });

        let names: FxHashMap<TrailId, String> = self
            .trails
            .iter()
            .map(|trail| (trail.id(), trail.name().to_string()))
            .collect();

        let mut routes = output.candidates;
        for route in &mut routes {
            route.derive_name(network, |id| names.get(&id).cloned());
        }

        self.summary.anchors_explored = output.stats.anchors_explored;
        self.summary.unreachable_queries = output.stats.unreachable_queries;
        self.summary.exhausted_searches = output.stats.exhausted_searches;
        self.summary.pattern_rejections = output.stats.pattern_rejections;
        self.summary.overlap_rejections = output.stats.overlap_rejections;
        self.summary.routes = routes.len();
        self.summary.finished_at = Some(Utc::now());

        info!(
            "discovered {} routes from {} trails",
            routes.len(),
            self.trails.len()
        );

        self.routes = routes;
        self.commit(Stage::Discover);

        Ok(&self.routes)
    }

    fn require(&self, requested: Stage, missing: Stage) -> Result<(), StageError> {
        if self.completed.contains(&missing) {
            Ok(())
        } else {
            Err(StageError::OutOfOrder { requested, missing })
        }
    }

    fn checkpoint(&self, stage: Stage) -> Result<(), StageError> {
        if self.cancel.is_cancelled() {
            Err(StageError::Cancelled(stage))
        } else {
            Ok(())
        }
    }

    fn commit(&mut self, stage: Stage) {
        if !self.completed.contains(&stage) {
            self.completed.push(stage);
            self.summary.stages_completed.push(stage);
        }
    }
}
