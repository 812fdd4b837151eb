//! WebSocket reload signaling.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Messages pushed to connected browser clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReloadMessage {
    /// Full page reload
    Reload,

    /// Connection established
    Connected,
}

/// Hub broadcasting reload signals to every connected client.
///
/// Sending is fire-and-forget: clients that miss a signal are not retried,
/// and sending with no clients connected is not an error.
#[derive(Debug, Clone)]
pub struct ReloadHub {
    sender: broadcast::Sender<ReloadMessage>,
}

impl ReloadHub {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(100);
        Self { sender }
    }

    /// Broadcast a reload signal to all currently connected clients.
    pub fn reload(&self) {
        self.send(ReloadMessage::Reload);
    }

    pub fn send(&self, msg: ReloadMessage) {
        // Ignore send errors (no receivers)
        let _ = self.sender.send(msg);
    }

    /// Subscribe to reload messages.
    pub fn subscribe(&self) -> broadcast::Receiver<ReloadMessage> {
        self.sender.subscribe()
    }

    /// Number of currently connected clients.
    pub fn client_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for ReloadHub {
    fn default() -> Self {
        Self::new()
    }
}

/// Generate the client-side reload script.
///
/// With `reload_on_restart`, a client that loses its connection (typically
/// because the dev server restarted) reloads the page as soon as it notices,
/// picking up both the fresh output and a fresh socket.
pub fn reload_client_script(ws_path: &str, reload_on_restart: bool) -> String {
    let on_close = if reload_on_restart {
        "setTimeout(function() { location.reload(); }, 1000);"
    } else {
        ""
    };

    format!(
        r#"
(function() {{
  'use strict';

  var proto = location.protocol === 'https:' ? 'wss://' : 'ws://';
  var ws = new WebSocket(proto + location.host + '{}');

  ws.onopen = function() {{
    console.log('[plinth] connected');
  }};

  ws.onmessage = function(event) {{
    var msg = JSON.parse(event.data);
    if (msg.type === 'reload') {{
      location.reload();
    }}
  }};

  ws.onclose = function() {{
    console.log('[plinth] disconnected');
    {}
  }};
}})();
"#,
        ws_path, on_close
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hub_broadcasts_reloads() {
        let hub = ReloadHub::new();
        let mut rx = hub.subscribe();

        hub.reload();

        match rx.try_recv() {
            Ok(ReloadMessage::Reload) => {}
            other => panic!("expected Reload, got {other:?}"),
        }
    }

    #[test]
    fn sending_without_clients_is_not_an_error() {
        let hub = ReloadHub::new();

        hub.reload();

        assert_eq!(hub.client_count(), 0);
    }

    #[test]
    fn serializes_tagged_messages() {
        let json = serde_json::to_string(&ReloadMessage::Reload).unwrap();

        assert!(json.contains("\"reload\""));
    }

    #[test]
    fn client_script_honors_reload_on_restart() {
        let with = reload_client_script("/__reload", true);
        let without = reload_client_script("/__reload", false);

        assert!(with.contains("/__reload"));
        assert!(with.contains("location.reload(); }, 1000"));
        assert!(!without.contains("location.reload(); }, 1000"));
    }
}
