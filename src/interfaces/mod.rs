// ============================================================
// INTERFACES LAYER
// ============================================================
// Boundary between the core and whatever shell renders it

pub mod interaction;

pub use interaction::{
    ChannelInteraction, InputRequest, Interaction, Notice, OutboundPrompt, ScriptedInteraction,
};
