//! Per-request operating mode.
//!
//! # Responsibility
//! - Turn host-provided request signals into a `RequestMode` and target id.
//! - Memoize that resolution for the lifetime of one `RequestContext`.
//!
//! # Invariants
//! - Signals are consulted at most once per context.
//! - A context never outlives its request. Hosts build a new one per request,
//!   so a resolved mode cannot leak into the next request on the same worker.

use crate::model::entity::EntityId;
use log::debug;
use once_cell::unsync::OnceCell;

/// Action name the host submits when saving the document editor form.
pub const EDIT_SAVE_ACTION: &str = "edit_save";

/// Host screen currently being served.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Screen {
    DocumentEditor,
    RevisionBrowser,
    #[default]
    Other,
}

/// Operating mode that gates metadata revision behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMode {
    Idle,
    /// Host is processing an edit-save action.
    Editing,
    /// Host is rendering a revision detail/compare page.
    ViewingRevision,
}

impl RequestMode {
    /// Field declaration and read overrides only run in these two modes.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Editing | Self::ViewingRevision)
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Editing => "editing",
            Self::ViewingRevision => "viewing_revision",
        }
    }
}

/// Ambient request state supplied by the host integration boundary.
pub trait RequestSignals {
    fn screen(&self) -> Screen;
    /// Action submitted with the current request, if any.
    fn submitted_action(&self) -> Option<&str>;
    /// Entity targeted by the in-flight edit action.
    fn edit_target(&self) -> Option<EntityId>;
    /// Revision id being displayed on the revision screen.
    fn viewed_revision(&self) -> Option<EntityId>;
}

/// Plain-data signals for hosts that already know their request state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FixedSignals {
    pub screen: Screen,
    pub action: Option<String>,
    pub edit_target: Option<EntityId>,
    pub viewed_revision: Option<EntityId>,
}

impl FixedSignals {
    /// Edit-save of `document_id` on the document editor.
    pub fn editing(document_id: EntityId) -> Self {
        Self {
            screen: Screen::DocumentEditor,
            action: Some(EDIT_SAVE_ACTION.to_string()),
            edit_target: Some(document_id),
            viewed_revision: None,
        }
    }

    /// Revision screen displaying `revision_id`.
    pub fn viewing_revision(revision_id: EntityId) -> Self {
        Self {
            screen: Screen::RevisionBrowser,
            action: None,
            edit_target: None,
            viewed_revision: Some(revision_id),
        }
    }
}

impl RequestSignals for FixedSignals {
    fn screen(&self) -> Screen {
        self.screen
    }

    fn submitted_action(&self) -> Option<&str> {
        self.action.as_deref()
    }

    fn edit_target(&self) -> Option<EntityId> {
        self.edit_target
    }

    fn viewed_revision(&self) -> Option<EntityId> {
        self.viewed_revision
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Resolved {
    mode: RequestMode,
    target_id: Option<EntityId>,
}

/// Request-scoped context threaded through every core operation.
pub struct RequestContext {
    signals: Box<dyn RequestSignals>,
    resolved: OnceCell<Resolved>,
}

impl RequestContext {
    pub fn new(signals: impl RequestSignals + 'static) -> Self {
        Self {
            signals: Box::new(signals),
            resolved: OnceCell::new(),
        }
    }

    /// Context for requests outside the editor and revision screens.
    pub fn idle() -> Self {
        Self::new(FixedSignals::default())
    }

    pub fn mode(&self) -> RequestMode {
        self.resolve().mode
    }

    /// Document id when editing, revision id when viewing a revision.
    pub fn target_id(&self) -> Option<EntityId> {
        self.resolve().target_id
    }

    fn resolve(&self) -> Resolved {
        *self.resolved.get_or_init(|| {
            let resolved = resolve_signals(self.signals.as_ref());
            debug!(
                "event=mode_resolve module=context status=ok mode={} has_target={}",
                resolved.mode.as_str(),
                resolved.target_id.is_some()
            );
            resolved
        })
    }
}

fn resolve_signals(signals: &dyn RequestSignals) -> Resolved {
    match signals.screen() {
        Screen::DocumentEditor if signals.submitted_action() == Some(EDIT_SAVE_ACTION) => Resolved {
            mode: RequestMode::Editing,
            target_id: signals.edit_target(),
        },
        Screen::RevisionBrowser => Resolved {
            mode: RequestMode::ViewingRevision,
            target_id: signals.viewed_revision(),
        },
        _ => Resolved {
            mode: RequestMode::Idle,
            target_id: None,
        },
    }
}
