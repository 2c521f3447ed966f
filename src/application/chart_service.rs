// Chart service - owns the live chart model and runs controller effects
use crate::application::clock::Clock;
use crate::application::document_repository::DocumentRepository;
use crate::domain::chart::{
    Action, ChartFrame, ChartModel, ChartSettings, DragAction, Effect, Update, update,
};
use crate::domain::doc::{self, Doc, Marker};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;

pub struct ChartService {
    model: Mutex<ChartModel>,
    settings: ChartSettings,
    repository: Arc<dyn DocumentRepository>,
    clock: Arc<dyn Clock>,
}

impl ChartService {
    pub fn new(
        model: ChartModel,
        settings: ChartSettings,
        repository: Arc<dyn DocumentRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            model: Mutex::new(model),
            settings,
            repository,
            clock,
        }
    }

    /// Apply one action under the model lock and hand back its effect.
    pub async fn dispatch(&self, action: Action) -> Effect {
        self.dispatch_at(action, self.clock.now_ms()).await
    }

    async fn dispatch_at(&self, action: Action, now: f64) -> Effect {
        let name = action.name();
        let mut model = self.model.lock().await;
        let Update {
            model: next,
            effect,
            changed,
        } = update(model.clone(), action, now, &self.settings);
        if changed {
            tracing::debug!("{} -> rev {}", name, next.series.rev());
        }
        *model = next;
        effect
    }

    /// Run an effect in the background. Scheduled actions re-enter
    /// `dispatch` and their own effects are spawned in turn, so a `Tick`
    /// keeps itself alive for the lifetime of the runtime.
    pub fn spawn_effect(self: &Arc<Self>, effect: Effect) {
        let Effect::Schedule { after, action } = effect else {
            return;
        };
        let service = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(after).await;
            let next = service.dispatch(action).await;
            service.spawn_effect(next);
        });
    }

    /// Dispatch, run the resulting effect and return the new frame.
    pub async fn apply(self: &Arc<Self>, action: Action) -> ChartFrame {
        let effect = self.dispatch(action).await;
        self.spawn_effect(effect);
        self.frame().await
    }

    pub async fn frame(&self) -> ChartFrame {
        let model = self.model.lock().await;
        ChartFrame::derive(&model, &self.settings)
    }

    /// Feed raw database documents into the chart. Returns how many were
    /// recognised as telemetry documents.
    pub async fn ingest(&self, raw: &[Value]) -> usize {
        let docs = doc::parse_batch(raw);
        let count = docs.len();
        if count < raw.len() {
            tracing::debug!("Skipped {} non-telemetry documents", raw.len() - count);
        }
        self.ingest_docs(docs).await;
        count
    }

    pub async fn ingest_docs(&self, docs: Vec<Doc>) {
        self.dispatch(Action::AddData(docs)).await;
    }

    pub async fn resize(self: &Arc<Self>, width: u32, height: u32) -> ChartFrame {
        self.apply(Action::Resize { width, height }).await
    }

    pub async fn move_xhair(self: &Arc<Self>, ratio: f64) -> ChartFrame {
        self.apply(Action::MoveXhair(ratio)).await
    }

    pub async fn scrub(self: &Arc<Self>, drag: DragAction) -> ChartFrame {
        self.apply(Action::Scrubber(drag)).await
    }

    /// Drop a marker at the current time and persist it. A failed write only
    /// loses persistence; the marker stays on the live chart.
    pub async fn drop_marker(&self) -> ChartFrame {
        let now = self.clock.now_ms();
        self.dispatch_at(Action::DropMarker, now).await;

        let marker = doc::marker_doc(&Marker::new(now, ""));
        if let Err(e) = self.repository.put(&marker).await {
            tracing::warn!("Failed to persist marker at {}: {:#}", now, e);
        }
        self.frame().await
    }
}
