//! # Checkout Controller
//!
//! Drives one embedded checkout attempt per confirmation token:
//! script → factory check → mount node → construct/render → listen.
//!
//! Each attempt runs as a single abortable task. Teardown (explicit `stop`,
//! a superseding `start`, or dropping the controller) aborts that task,
//! destroys the widget and removes the script this controller injected.
//! A generation counter gates every state change and callback, so events
//! from a superseded attempt are dropped.

use crate::config::WidgetConfig;
use crate::error::{CheckoutError, CheckoutResult};
use crate::lifecycle::LifecycleState;
use crate::platform::{
    Document, EventPayload, Platform, ScriptTag, Toast, WidgetFactory, WidgetHandle,
    WidgetOptions,
};
use crate::token::ConfirmationToken;
use futures::channel::mpsc::{self, UnboundedReceiver};
use futures::future::{self, AbortHandle, Abortable, Either};
use futures::{FutureExt, StreamExt};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

type SuccessCallback = Box<dyn FnOnce()>;
type ErrorCallback = Box<dyn FnOnce(String)>;

struct Callbacks {
    on_success: SuccessCallback,
    on_error: ErrorCallback,
}

#[derive(Default)]
struct Inner {
    generation: u64,
    state: LifecycleState,
    widget: Option<Rc<dyn WidgetHandle>>,
    owned_script: Option<ScriptTag>,
    task: Option<AbortHandle>,
    callbacks: Option<Callbacks>,
}

/// Lifecycle controller for the embedded checkout widget.
///
/// Holds at most one attempt (and one widget) at a time.
pub struct CheckoutController {
    platform: Platform,
    config: Rc<WidgetConfig>,
    inner: Rc<RefCell<Inner>>,
}

impl CheckoutController {
    /// Create a controller; fails only on invalid configuration
    pub fn new(platform: Platform, config: WidgetConfig) -> CheckoutResult<Self> {
        config.validate()?;
        Ok(Self {
            platform,
            config: Rc::new(config),
            inner: Rc::new(RefCell::new(Inner::default())),
        })
    }

    pub fn config(&self) -> &WidgetConfig {
        &self.config
    }

    /// Current lifecycle state
    pub fn state(&self) -> LifecycleState {
        self.inner.borrow().state
    }

    /// True while an attempt is loading, polling or mounted
    pub fn is_active(&self) -> bool {
        self.state().is_in_progress()
    }

    /// Start a checkout attempt for `token`.
    ///
    /// An absent or blank token is a no-op. Otherwise any previous attempt is
    /// torn down first, and exactly one of `on_success`/`on_error` fires for
    /// this attempt unless it is torn down before reaching an outcome.
    pub fn start<S, E>(&self, token: Option<&str>, on_success: S, on_error: E)
    where
        S: FnOnce() + 'static,
        E: FnOnce(String) + 'static,
    {
        let Some(token) = ConfirmationToken::parse(token) else {
            warn!("No confirmation token, checkout widget not started");
            return;
        };

        self.teardown();

        let generation = {
            let mut inner = self.inner.borrow_mut();
            inner.generation += 1;
            inner.callbacks = Some(Callbacks {
                on_success: Box::new(on_success),
                on_error: Box::new(on_error),
            });
            inner.generation
        };

        info!(
            token = %token.redacted(),
            generation,
            "Starting checkout widget"
        );

        let attempt = Attempt {
            platform: self.platform.clone(),
            config: Rc::clone(&self.config),
            inner: Rc::clone(&self.inner),
            generation,
            token,
        };

        let (handle, registration) = AbortHandle::new_pair();
        self.inner.borrow_mut().task = Some(handle);

        let task = Abortable::new(attempt.run(), registration);
        self.platform.scheduler.spawn(
            async move {
                let _ = task.await;
            }
            .boxed_local(),
        );
    }

    /// Tear down the current attempt. Safe to call in any state, any number of times.
    pub fn stop(&self) {
        self.teardown();
    }

    fn teardown(&self) {
        let (task, widget, script, previous) = {
            let mut inner = self.inner.borrow_mut();
            inner.generation += 1;
            inner.callbacks = None;
            let previous = inner.state;
            if previous != LifecycleState::Idle {
                inner.state = LifecycleState::Torndown;
            }
            (
                inner.task.take(),
                inner.widget.take(),
                inner.owned_script.take(),
                previous,
            )
        };

        if let Some(task) = task {
            task.abort();
        }
        if let Some(widget) = widget {
            widget.destroy();
        }
        if let Some(script) = script {
            self.platform.document.remove_script(&script);
        }

        if previous != LifecycleState::Idle && previous != LifecycleState::Torndown {
            debug!(from = %previous, "Checkout widget torn down");
        }
    }
}

impl Drop for CheckoutController {
    fn drop(&mut self) {
        self.teardown();
    }
}

enum WidgetEvent {
    Success,
    Error(EventPayload),
}

/// Why an attempt stopped short of an outcome
enum Halt {
    /// A newer attempt or teardown took over
    Superseded,
    Failed(CheckoutError),
}

impl From<CheckoutError> for Halt {
    fn from(err: CheckoutError) -> Self {
        Halt::Failed(err)
    }
}

struct Attempt {
    platform: Platform,
    config: Rc<WidgetConfig>,
    inner: Rc<RefCell<Inner>>,
    generation: u64,
    token: ConfirmationToken,
}

impl Attempt {
    #[instrument(name = "checkout_attempt", skip(self), fields(generation = self.generation))]
    async fn run(self) {
        match self.drive().await {
            Ok(()) => {}
            Err(Halt::Superseded) => debug!("Attempt superseded"),
            Err(Halt::Failed(err)) => self.fail(err),
        }
    }

    async fn drive(&self) -> Result<(), Halt> {
        let document = Rc::clone(&self.platform.document);

        if document.has_script(&self.config.script_url) {
            debug!("Processor script already present");
            self.advance(LifecycleState::ScriptReady)?;
        } else {
            self.advance(LifecycleState::ScriptLoading)?;
            self.load_script(document.as_ref()).await?;
            self.advance(LifecycleState::ScriptReady)?;
        }

        let factory = document
            .widget_factory(&self.config.factory_global)
            .ok_or_else(|| CheckoutError::FactoryMissing {
                global: self.config.factory_global.clone(),
            })?;

        self.advance(LifecycleState::AwaitingMount)?;
        self.await_mount(document.as_ref()).await?;

        self.advance(LifecycleState::Mounted)?;
        let mut events = self.mount(factory.as_ref()).await?;
        info!(element = %self.config.mount_element_id, "Checkout widget mounted");

        match events.next().await {
            Some(WidgetEvent::Success) => self.succeed().await,
            Some(WidgetEvent::Error(payload)) => Err(CheckoutError::ProcessorReported {
                message: payload.message,
            }
            .into()),
            None => Err(Halt::Superseded),
        }
    }

    async fn load_script(&self, document: &dyn Document) -> Result<(), Halt> {
        let src = &self.config.script_url;
        let tag = document.inject_script(src).map_err(|e| script_error(src, e))?;
        debug!(src = %src, id = %tag.element_id, "Injected processor script");

        {
            let mut inner = self.inner.borrow_mut();
            if inner.generation != self.generation {
                drop(inner);
                document.remove_script(&tag);
                return Err(Halt::Superseded);
            }
            inner.owned_script = Some(tag.clone());
        }

        let loaded = document.wait_for_script(&tag);
        let timeout = self.platform.scheduler.sleep(self.config.script_timeout());

        let outcome = match future::select(loaded, timeout).await {
            Either::Left((Ok(()), _)) => Ok(()),
            Either::Left((Err(err), _)) => Err(script_error(src, err).into()),
            Either::Right(_) => Err(CheckoutError::ScriptLoad {
                src: src.clone(),
                reason: format!("no load event within {} ms", self.config.script_timeout_ms),
            }
            .into()),
        };
        outcome
    }

    /// Poll for the mount node until it appears or the timeout elapses.
    /// The last sleep is cut short so the final check lands on the deadline.
    async fn await_mount(&self, document: &dyn Document) -> Result<(), Halt> {
        let element_id = &self.config.mount_element_id;
        let timeout = self.config.mount_timeout();
        let interval = self.config.poll_interval();
        let mut waited = Duration::ZERO;

        while waited < timeout {
            if document.has_element(element_id) {
                return Ok(());
            }
            let step = interval.min(timeout - waited);
            self.platform.scheduler.sleep(step).await;
            waited += step;
        }

        if document.has_element(element_id) {
            return Ok(());
        }

        Err(CheckoutError::MountTimeout {
            element_id: element_id.clone(),
            waited_ms: self.config.mount_timeout_ms,
        }
        .into())
    }

    async fn mount(
        &self,
        factory: &dyn WidgetFactory,
    ) -> Result<UnboundedReceiver<WidgetEvent>, Halt> {
        let options = WidgetOptions::new(&self.token, &self.config);
        let widget: Rc<dyn WidgetHandle> =
            Rc::from(factory.create(&options).map_err(construction_error)?);

        // Owned before render so teardown destroys it whatever happens next.
        {
            let mut inner = self.inner.borrow_mut();
            if inner.generation != self.generation {
                drop(inner);
                widget.destroy();
                return Err(Halt::Superseded);
            }
            inner.widget = Some(Rc::clone(&widget));
        }

        widget
            .render(&self.config.mount_element_id)
            .await
            .map_err(construction_error)?;

        let (tx, rx) = mpsc::unbounded();
        let success_tx = tx.clone();
        widget
            .on(
                &self.config.success_event,
                Box::new(move |_| {
                    let _ = success_tx.unbounded_send(WidgetEvent::Success);
                }),
            )
            .map_err(construction_error)?;
        widget
            .on(
                &self.config.error_event,
                Box::new(move |payload| {
                    let _ = tx.unbounded_send(WidgetEvent::Error(payload));
                }),
            )
            .map_err(construction_error)?;

        Ok(rx)
    }

    async fn succeed(&self) -> Result<(), Halt> {
        self.advance(LifecycleState::Succeeded)?;
        info!("Checkout succeeded");
        self.platform.notifier.notify(Toast::success());

        self.platform
            .scheduler
            .sleep(self.config.success_delay())
            .await;

        if let Some(callbacks) = self.take_callbacks() {
            (callbacks.on_success)();
        }
        Ok(())
    }

    fn fail(&self, err: CheckoutError) {
        if self.advance(LifecycleState::Failed).is_err() {
            return;
        }
        warn!(error = %err, "Checkout attempt failed");

        let message = err.user_message();
        self.platform.notifier.notify(Toast::error(message.clone()));
        if let Some(callbacks) = self.take_callbacks() {
            (callbacks.on_error)(message);
        }
    }

    fn advance(&self, next: LifecycleState) -> Result<(), Halt> {
        let mut inner = self.inner.borrow_mut();
        if inner.generation != self.generation {
            return Err(Halt::Superseded);
        }
        if !inner.state.can_transition_to(next) {
            warn!(from = %inner.state, to = %next, "Ignoring illegal lifecycle transition");
            return Err(Halt::Superseded);
        }
        debug!(from = %inner.state, to = %next, "Lifecycle transition");
        inner.state = next;
        Ok(())
    }

    fn take_callbacks(&self) -> Option<Callbacks> {
        let mut inner = self.inner.borrow_mut();
        if inner.generation != self.generation {
            return None;
        }
        inner.callbacks.take()
    }
}

fn script_error(src: &str, err: CheckoutError) -> CheckoutError {
    match err {
        err @ CheckoutError::ScriptLoad { .. } => err,
        other => CheckoutError::ScriptLoad {
            src: src.to_string(),
            reason: other.to_string(),
        },
    }
}

fn construction_error(err: CheckoutError) -> CheckoutError {
    match err {
        err @ CheckoutError::Construction(_) => err,
        other => CheckoutError::Construction(other.to_string()),
    }
}
