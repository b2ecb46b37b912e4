// Satu ConnectionAgent per koneksi WebSocket: outbound worker untuk queue + ping
// dan inbound loop yang meneruskan message valid ke messaging.
use axum::{body::Bytes, extract::ws::Message};
use futures::{Sink, SinkExt, Stream, StreamExt};
use std::{fmt::Display, sync::Arc, time::Duration};
use tokio::{sync::mpsc, time::Instant};

use crate::{
    domain::InboundFrame,
    hub::{ConversationHub, Outbound},
    messaging::{self, SharedChatStore},
};

#[derive(Debug, Clone, Copy)]
pub struct AgentSettings {
    pub ping_interval: Duration,
    pub idle_timeout: Duration,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            ping_interval: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(90),
        }
    }
}

pub struct ConnectionAgent {
    pub hub: Arc<ConversationHub>,
    pub store: SharedChatStore,
    pub conversation_id: i32,
    pub user_id: i32,
    pub settings: AgentSettings,
}

impl ConnectionAgent {
    /// Jalankan koneksi sampai transport berakhir atau writer gagal.
    /// Registrasi di hub selalu dilepas saat fungsi ini selesai.
    pub async fn run<W, R>(self, sink: W, mut stream: R)
    where
        W: Sink<Message> + Unpin + Send + 'static,
        W::Error: Display,
        R: Stream<Item = Result<Message, axum::Error>> + Unpin + Send,
    {
        let (registration, queue) = self.hub.register(self.conversation_id, self.user_id);
        let connection_id = registration.connection_id();

        let mut writer = tokio::spawn(write_loop(sink, queue, self.settings.ping_interval));
        let mut writer_done = false;

        loop {
            tokio::select! {
                _ = &mut writer => {
                    tracing::debug!(%connection_id, "Outbound worker finished");
                    writer_done = true;
                    break;
                }
                next = tokio::time::timeout(self.settings.idle_timeout, stream.next()) => {
                    match next {
                        Err(_) => {
                            tracing::info!(%connection_id, "Connection idle timeout");
                            break;
                        }
                        Ok(None) => break,
                        Ok(Some(Err(e))) => {
                            tracing::warn!(%connection_id, "WebSocket read error: {}", e);
                            break;
                        }
                        Ok(Some(Ok(Message::Text(text)))) => self.handle_text(text.as_str()).await,
                        Ok(Some(Ok(Message::Close(frame)))) => {
                            tracing::debug!(%connection_id, "Closed by client: {:?}", frame);
                            break;
                        }
                        // Ping, pong, binary: cukup dihitung sebagai aktivitas
                        Ok(Some(Ok(_))) => {}
                    }
                }
            }
        }

        drop(registration);
        if !writer_done {
            writer.abort();
        }

        tracing::info!(
            %connection_id,
            conversation_id = self.conversation_id,
            user_id = self.user_id,
            "Connection closed"
        );
    }

    async fn handle_text(&self, text: &str) {
        // Payload rusak diabaikan tanpa error frame
        let Some(frame) = InboundFrame::parse(text) else {
            tracing::debug!(conversation_id = self.conversation_id, user_id = self.user_id, "Ignoring invalid inbound frame");
            return;
        };

        if let Err(e) = messaging::persist_and_broadcast(
            self.store.as_ref(),
            &self.hub,
            self.conversation_id,
            self.user_id,
            &frame.content,
        )
        .await
        {
            tracing::error!(
                conversation_id = self.conversation_id,
                user_id = self.user_id,
                "Failed to persist message: {}",
                e
            );
        }
    }
}

// Drain queue ke transport dalam urutan FIFO, plus ping periodik
async fn write_loop<W>(mut sink: W, mut queue: mpsc::Receiver<Outbound>, ping_interval: Duration)
where
    W: Sink<Message> + Unpin,
    W::Error: Display,
{
    let mut ping = tokio::time::interval_at(Instant::now() + ping_interval, ping_interval);

    loop {
        tokio::select! {
            frame = queue.recv() => {
                let Some(frame) = frame else { break };

                let text = match serde_json::to_string(frame.as_ref()) {
                    Ok(text) => text,
                    Err(e) => {
                        tracing::error!("Failed to encode message frame: {}", e);
                        continue;
                    }
                };

                if let Err(e) = sink.send(Message::Text(text.into())).await {
                    tracing::debug!("WebSocket write failed: {}", e);
                    break;
                }
            }
            _ = ping.tick() => {
                if let Err(e) = sink.send(Message::Ping(Bytes::new())).await {
                    tracing::debug!("WebSocket ping failed: {}", e);
                    break;
                }
            }
        }
    }

    let _ = sink.close().await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::MessageFrame,
        error::StoreError,
        messaging::{memory::MemoryChatStore, MockChatStore},
    };
    use futures::channel::mpsc as fmpsc;

    const CLIENT: i32 = 10;
    const SPECIALIST: i32 = 20;

    type InboundTx = fmpsc::UnboundedSender<Result<Message, axum::Error>>;
    type OutboundRx = fmpsc::UnboundedReceiver<Message>;

    fn quiet_settings() -> AgentSettings {
        AgentSettings {
            ping_interval: Duration::from_secs(3600),
            idle_timeout: Duration::from_secs(3600),
        }
    }

    fn spawn_agent(
        hub: &Arc<ConversationHub>,
        store: SharedChatStore,
        user_id: i32,
        settings: AgentSettings,
    ) -> (InboundTx, OutboundRx, tokio::task::JoinHandle<()>) {
        let (in_tx, in_rx) = fmpsc::unbounded::<Result<Message, axum::Error>>();
        let (out_tx, out_rx) = fmpsc::unbounded::<Message>();

        let agent = ConnectionAgent {
            hub: Arc::clone(hub),
            store,
            conversation_id: 1,
            user_id,
            settings,
        };
        let handle = tokio::spawn(agent.run(out_tx, in_rx));
        (in_tx, out_rx, handle)
    }

    async fn wait_for_connections(hub: &ConversationHub, expected: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while hub.connection_count(1) != expected {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("hub never reached expected connection count");
    }

    async fn next_frame(out: &mut OutboundRx) -> MessageFrame {
        let message = tokio::time::timeout(Duration::from_secs(5), out.next())
            .await
            .expect("no outbound frame")
            .expect("outbound closed");
        match message {
            Message::Text(text) => serde_json::from_str(text.as_str()).unwrap(),
            other => panic!("unexpected outbound message: {:?}", other),
        }
    }

    fn text(body: &str) -> Result<Message, axum::Error> {
        Ok(Message::Text(body.to_string().into()))
    }

    #[tokio::test]
    async fn test_message_reaches_sender_and_peer() {
        let hub = Arc::new(ConversationHub::default());
        let store = Arc::new(MemoryChatStore::with_conversation(1, CLIENT, SPECIALIST));
        let (_peer, mut peer_rx) = hub.register(1, SPECIALIST);

        let (in_tx, mut out_rx, _handle) = spawn_agent(&hub, store.clone(), CLIENT, quiet_settings());
        wait_for_connections(&hub, 2).await;

        in_tx.unbounded_send(text(r#"{"content":"halo dok"}"#)).unwrap();

        let echoed = next_frame(&mut out_rx).await;
        assert_eq!(echoed.content, "halo dok");
        assert_eq!(echoed.sender_id, Some(CLIENT));
        assert_eq!(echoed.conversation_id, 1);

        let delivered = tokio::time::timeout(Duration::from_secs(5), peer_rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(delivered.id, echoed.id);
        assert_eq!(store.messages().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_frames_are_ignored() {
        let hub = Arc::new(ConversationHub::default());
        let store = Arc::new(MemoryChatStore::with_conversation(1, CLIENT, SPECIALIST));
        let (in_tx, mut out_rx, handle) = spawn_agent(&hub, store.clone(), CLIENT, quiet_settings());
        wait_for_connections(&hub, 1).await;

        in_tx.unbounded_send(text("not json")).unwrap();
        in_tx.unbounded_send(text(r#"{"content":""}"#)).unwrap();
        in_tx.unbounded_send(text(&format!(r#"{{"content":"{}"}}"#, "x".repeat(2001)))).unwrap();
        in_tx.unbounded_send(text(r#"{"content":"masih hidup"}"#)).unwrap();

        // Hanya message valid terakhir yang sampai, koneksi tetap jalan
        let frame = next_frame(&mut out_rx).await;
        assert_eq!(frame.content, "masih hidup");
        assert_eq!(store.messages().len(), 1);
        assert!(!handle.is_finished());
    }

    #[tokio::test]
    async fn test_client_close_unregisters() {
        let hub = Arc::new(ConversationHub::default());
        let store = Arc::new(MemoryChatStore::with_conversation(1, CLIENT, SPECIALIST));
        let (in_tx, _out_rx, handle) = spawn_agent(&hub, store, CLIENT, quiet_settings());
        wait_for_connections(&hub, 1).await;

        in_tx.unbounded_send(Ok(Message::Close(None))).unwrap();
        tokio::time::timeout(Duration::from_secs(5), handle).await.unwrap().unwrap();

        assert_eq!(hub.connection_count(1), 0);
    }

    #[tokio::test]
    async fn test_transport_end_and_read_error_unregister() {
        let hub = Arc::new(ConversationHub::default());
        let store: SharedChatStore = Arc::new(MemoryChatStore::with_conversation(1, CLIENT, SPECIALIST));

        let (in_tx, _out, handle) = spawn_agent(&hub, store.clone(), CLIENT, quiet_settings());
        wait_for_connections(&hub, 1).await;
        drop(in_tx);
        tokio::time::timeout(Duration::from_secs(5), handle).await.unwrap().unwrap();
        assert_eq!(hub.connection_count(1), 0);

        let (in_tx, _out, handle) = spawn_agent(&hub, store, CLIENT, quiet_settings());
        wait_for_connections(&hub, 1).await;
        in_tx.unbounded_send(Err(axum::Error::new("connection reset"))).unwrap();
        tokio::time::timeout(Duration::from_secs(5), handle).await.unwrap().unwrap();
        assert_eq!(hub.connection_count(1), 0);
    }

    #[tokio::test]
    async fn test_write_failure_ends_connection() {
        let hub = Arc::new(ConversationHub::default());
        let store = Arc::new(MemoryChatStore::with_conversation(1, CLIENT, SPECIALIST));
        let (_in_tx, out_rx, handle) = spawn_agent(&hub, store.clone(), CLIENT, quiet_settings());
        wait_for_connections(&hub, 1).await;

        // Transport sisi tulis mati, write berikutnya gagal
        drop(out_rx);
        messaging::persist_and_broadcast(store.as_ref(), &hub, 1, SPECIALIST, "halo")
            .await
            .unwrap();

        tokio::time::timeout(Duration::from_secs(5), handle).await.unwrap().unwrap();
        assert_eq!(hub.connection_count(1), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_connection_times_out() {
        let hub = Arc::new(ConversationHub::default());
        let store = Arc::new(MemoryChatStore::with_conversation(1, CLIENT, SPECIALIST));
        let settings = AgentSettings {
            ping_interval: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(90),
        };
        let (_in_tx, mut out_rx, handle) = spawn_agent(&hub, store, CLIENT, settings);

        handle.await.unwrap();
        assert_eq!(hub.connection_count(1), 0);

        // Ping sempat dikirim sebelum timeout
        let mut pings = 0;
        while let Ok(message) = out_rx.try_recv() {
            if matches!(message, Message::Ping(_)) {
                pings += 1;
            }
        }
        assert!(pings >= 2);
    }

    #[tokio::test]
    async fn test_persist_failure_keeps_connection_open() {
        let mut mock = MockChatStore::new();
        mock.expect_persist_message()
            .returning(|_, _, _| Err(StoreError::Unavailable("db down".to_string())));

        let hub = Arc::new(ConversationHub::default());
        let (in_tx, mut out_rx, handle) = spawn_agent(&hub, Arc::new(mock), CLIENT, quiet_settings());
        wait_for_connections(&hub, 1).await;

        in_tx.unbounded_send(text(r#"{"content":"halo"}"#)).unwrap();
        tokio::task::yield_now().await;

        assert!(tokio::time::timeout(Duration::from_millis(100), out_rx.next()).await.is_err());
        assert!(!handle.is_finished());
        assert_eq!(hub.connection_count(1), 1);
    }
}
