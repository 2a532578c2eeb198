//! Delivering messages to player inboxes.

use crate::config::SimConfig;
use crate::coords::{Duration, PlayerNumber};
use crate::messages::{message_sound, Message, MessageId, MessageStatus};
use crate::queue::Scheduled;
use crate::state::{Notification, WorldState};
use crate::step::ActionError;

/// Add `message` to `player`'s inbox.
///
/// Messages with a finite duration are scheduled to expire. The interactive
/// player additionally gets a sound and, with `popup`, a popup request.
pub fn add_message(
    state: &mut WorldState,
    player: PlayerNumber,
    message: Message,
    popup: bool,
    config: &SimConfig,
) -> Option<MessageId> {
    let duration = message.duration;
    let fx = message_sound(&message.sender);
    let id = state.players.get_mut(player)?.messages.add(message);

    if let Some(duration) = duration {
        state.queue.schedule(
            state.gametime.saturating_add(duration),
            Scheduled::MessageExpiry {
                player,
                message: id,
            },
        );
    }
    if config.interactive_player == player {
        if config.sound_at_message {
            state.notifications.push(Notification::PlayMessageSound {
                player,
                fx: fx.to_string(),
            });
        }
        if popup {
            state
                .notifications
                .push(Notification::PopupMessage { player, message: id });
        }
    }
    Some(id)
}

/// Add `message` unless a message from the same sender arrived less than
/// `timeout` ago within `radius` of it.
pub fn add_message_with_timeout(
    state: &mut WorldState,
    player: PlayerNumber,
    message: Message,
    timeout: Duration,
    radius: u32,
    config: &SimConfig,
) -> Option<MessageId> {
    let inbox = &state.players.get(player)?.messages;
    if inbox.has_similar(&state.map, &message, state.gametime, timeout, radius) {
        log::trace!(
            "Player {}: dropping message from {} at {}, similar one pending",
            player,
            message.sender,
            message.position
        );
        return None;
    }
    add_message(state, player, message, false, config)
}

pub fn set_message_status(
    state: &mut WorldState,
    player: PlayerNumber,
    message: MessageId,
    status: MessageStatus,
) -> Result<(), ActionError> {
    let inbox = &mut state
        .players
        .get_mut(player)
        .ok_or(ActionError::NoSuchPlayer(player))?
        .messages;
    if !inbox.set_status(message, status) {
        return Err(ActionError::NoSuchMessage(message));
    }
    Ok(())
}

/// Drop an expired message. It may already be gone.
pub fn expire_message(state: &mut WorldState, player: PlayerNumber, message: MessageId) {
    if let Some(p) = state.players.get_mut(player) {
        p.messages.remove(message);
    }
}
