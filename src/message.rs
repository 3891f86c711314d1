/*!
    Indications sent by the core to the host.

    Producers (ticks, RPC receptions, parameter writes, status changes) push [Message]s in a [MessageChannel], the host worker loop pops them one at a time in the order they were sent.

    The channel never blocks: it has a fixed capacity and a message sent to a full channel is dropped and counted.
*/

use core::fmt;
use log::warn;
use crate::{
    config::MESSAGE_QUEUE_SIZE,
    error::ErrorCode,
    status::Status,
    };


/// indication sent from the core to the host
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Message {
    /// output data from the PLC is available
    Avail,
    /// input data for the PLC should be prepared
    Sync,
    /// a parameter was written
    ParamWrite {slot_ix: u16, param_ix: u16},
    /// periodic poll
    Poll,
    /// the core status changed, contains the new status
    Status(Status),
    /// an error occurred
    Error(ErrorCode),
}
impl Message {
    pub fn id(&self) -> MessageId {
        match self {
            Self::Avail => MessageId::Avail,
            Self::Sync => MessageId::Sync,
            Self::ParamWrite {..} => MessageId::ParamWriteInd,
            Self::Poll => MessageId::PollInd,
            Self::Status(_) => MessageId::StatusInd,
            Self::Error(_) => MessageId::ErrorInd,
        }
    }
}

/// identifier of a [Message] kind, without its parameters
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum MessageId {
    Avail,
    Sync,
    ParamWriteInd,
    PollInd,
    StatusInd,
    ErrorInd,
}
impl MessageId {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Avail => "AVAIL",
            Self::Sync => "SYNC",
            Self::ParamWriteInd => "PARAM_WRITE_IND",
            Self::PollInd => "POLL_IND",
            Self::StatusInd => "STATUS_IND",
            Self::ErrorInd => "ERROR_IND",
        }
    }
}
impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}


/**
    bounded FIFO of messages

    This struct does no locking by itself, the owner is responsible for serializing producers and the consumer (see [crate::Core]).
*/
pub struct MessageChannel<const N: usize = MESSAGE_QUEUE_SIZE> {
    queue: heapless::Deque<Message, N>,
    /// number of messages dropped because the channel was full
    dropped: u32,
}
impl<const N: usize> MessageChannel<N> {
    pub fn new() -> Self {
        Self {queue: heapless::Deque::new(), dropped: 0}
    }
    /**
        append a message at the end of the channel

        If the channel is full the message is dropped, the dropped counter is incremented and `false` is returned. Messages already in the channel are never altered.
    */
    pub fn send(&mut self, message: Message) -> bool {
        match self.queue.push_back(message) {
            Ok(()) => true,
            Err(message) => {
                self.dropped = self.dropped.wrapping_add(1);
                warn!("message channel full, {} dropped ({} so far)", message.id(), self.dropped);
                false
            },
        }
    }
    /// pop the oldest message, if any
    pub fn receive(&mut self) -> Option<Message> {
        self.queue.pop_front()
    }

    pub fn len(&self) -> usize  {self.queue.len()}
    pub fn is_empty(&self) -> bool  {self.queue.is_empty()}
    pub fn is_full(&self) -> bool  {self.queue.is_full()}
    pub fn capacity(&self) -> usize  {N}
    /// number of messages dropped since creation
    pub fn dropped(&self) -> u32  {self.dropped}
    /// pending messages, oldest first, without consuming them
    pub fn iter(&self) -> impl Iterator<Item=&Message> + '_  {self.queue.iter()}
    /// forget all pending messages, the dropped counter is kept
    pub fn clear(&mut self)  {self.queue.clear()}
}
impl<const N: usize> Default for MessageChannel<N> {
    fn default() -> Self  {Self::new()}
}
impl<const N: usize> fmt::Debug for MessageChannel<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageChannel")
            .field("pending", &self.len())
            .field("capacity", &N)
            .field("dropped", &self.dropped)
            .finish()
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fifo_order() {
        let mut channel = MessageChannel::<10>::new();
        assert!(channel.send(Message::Avail));
        assert!(channel.send(Message::ParamWrite {slot_ix: 1, param_ix: 2}));
        assert!(channel.send(Message::Sync));
        assert_eq!(channel.receive(), Some(Message::Avail));
        assert_eq!(channel.receive(), Some(Message::ParamWrite {slot_ix: 1, param_ix: 2}));
        assert_eq!(channel.receive(), Some(Message::Sync));
        assert_eq!(channel.receive(), None);
    }

    #[test]
    fn overflow_drops_newest() {
        let mut channel = MessageChannel::<10>::new();
        for i in 0 .. 10 {
            assert!(channel.send(Message::ParamWrite {slot_ix: 0, param_ix: i}));
        }
        assert!(channel.is_full());
        assert!(!channel.send(Message::Poll));
        assert!(!channel.send(Message::Error(ErrorCode::Crc)));
        assert_eq!(channel.len(), 10);
        assert_eq!(channel.dropped(), 2);
        for i in 0 .. 10 {
            assert_eq!(channel.receive(), Some(Message::ParamWrite {slot_ix: 0, param_ix: i}));
        }
        assert!(channel.is_empty());
        // room again after draining
        assert!(channel.send(Message::Poll));
    }

    #[test]
    fn default_capacity() {
        let channel: MessageChannel = MessageChannel::default();
        assert_eq!(channel.capacity(), MESSAGE_QUEUE_SIZE);
        assert_eq!(MESSAGE_QUEUE_SIZE, 10);
    }

    #[test]
    fn ids() {
        assert_eq!(Message::Poll.id().as_str(), "POLL_IND");
        assert_eq!(Message::Error(ErrorCode::Internal).id(), MessageId::ErrorInd);
        assert_eq!(Message::Status(Status::from(0)).id().to_string(), "STATUS_IND");
    }
}
