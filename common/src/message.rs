use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::{generate_id, UserId};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

/// A direct message between two users. Append-only apart from `read`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: MessageId,
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub read: bool,
}

impl Message {
    pub fn new(sender: &UserId, receiver: &UserId, text: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: MessageId(generate_id("msg", now)),
            sender_id: sender.clone(),
            receiver_id: receiver.clone(),
            text: text.into(),
            timestamp: now,
            read: false,
        }
    }

    fn between(&self, a: &UserId, b: &UserId) -> bool {
        (&self.sender_id == a && &self.receiver_id == b) || (&self.sender_id == b && &self.receiver_id == a)
    }

    /// The other participant, seen from `user`.
    fn partner_of(&self, user: &UserId) -> Option<&UserId> {
        if &self.sender_id == user {
            Some(&self.receiver_id)
        } else if &self.receiver_id == user {
            Some(&self.sender_id)
        } else {
            None
        }
    }
}

/// Messages exchanged by `a` and `b`, oldest first. Equal timestamps keep
/// storage order.
pub fn conversation<'a>(messages: &'a [Message], a: &UserId, b: &UserId) -> Vec<&'a Message> {
    let mut thread: Vec<&Message> = messages.iter().filter(|m| m.between(a, b)).collect();
    thread.sort_by_key(|m| m.timestamp);
    thread
}

/// Mark everything `sender` sent to `reader` as read. Returns how many changed.
pub fn mark_read(messages: &mut [Message], reader: &UserId, sender: &UserId) -> usize {
    let mut changed = 0;
    for m in messages
        .iter_mut()
        .filter(|m| &m.receiver_id == reader && &m.sender_id == sender && !m.read)
    {
        m.read = true;
        changed += 1;
    }
    changed
}

pub fn unread_count(messages: &[Message], user: &UserId) -> usize {
    messages
        .iter()
        .filter(|m| &m.receiver_id == user && !m.read)
        .count()
}

/// One chat thread as listed in the inbox.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub partner_id: UserId,
    pub last_message: Message,
    pub message_count: usize,
    pub unread: usize,
}

/// Every thread `user` takes part in, most recently active first.
pub fn conversations(messages: &[Message], user: &UserId) -> Vec<ConversationSummary> {
    let mut threads: Vec<ConversationSummary> = Vec::new();
    for m in messages {
        let Some(partner) = m.partner_of(user) else {
            continue;
        };
        let unread = usize::from(&m.receiver_id == user && !m.read);
        match threads.iter_mut().find(|t| &t.partner_id == partner) {
            Some(thread) => {
                thread.message_count += 1;
                thread.unread += unread;
                if m.timestamp >= thread.last_message.timestamp {
                    thread.last_message = m.clone();
                }
            }
            None => threads.push(ConversationSummary {
                partner_id: partner.clone(),
                last_message: m.clone(),
                message_count: 1,
                unread,
            }),
        }
    }
    threads.sort_by(|a, b| b.last_message.timestamp.cmp(&a.last_message.timestamp));
    threads
}
