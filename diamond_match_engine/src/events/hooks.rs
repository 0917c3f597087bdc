use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{DealerNotifiedEvent, EventHandler, EventProducer, Handler};

#[derive(Default, Clone)]
pub struct EventProducers {
    pub dealer_notified_producer: Vec<EventProducer<DealerNotifiedEvent>>,
}

pub struct EventHandlers {
    pub on_dealer_notified: Option<EventHandler<DealerNotifiedEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_dealer_notified = hooks.on_dealer_notified.map(|f| EventHandler::new(buffer_size, f));
        Self { on_dealer_notified }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_dealer_notified {
            result.dealer_notified_producer.push(handler.subscribe());
        }
        result
    }

    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_dealer_notified {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_dealer_notified: Option<Handler<DealerNotifiedEvent>>,
}

impl EventHooks {
    pub fn on_dealer_notified<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(DealerNotifiedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_dealer_notified = Some(Arc::new(f));
        self
    }
}
