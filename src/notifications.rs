use tracing::info;

/// Winner notification emitted when an auction closes with at least one bid.
/// Emitted as a structured event; the mail transport itself is deployment
/// concern and not wired here.
#[derive(Debug, PartialEq, Eq)]
pub struct WinnerNotification {
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

impl WinnerNotification {
    pub fn new(recipient: &str, auction_title: &str) -> Self {
        WinnerNotification {
            recipient: recipient.to_string(),
            subject: "Congratulations!".to_string(),
            body: format!("Your bid was the winning one: \"{auction_title}\"."),
        }
    }

    pub fn dispatch(&self) {
        info!(
            recipient = %self.recipient,
            subject = %self.subject,
            body = %self.body,
            "winner notification"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notification_addresses_the_winning_bidder() {
        let note = WinnerNotification::new("winner@example.com", "Road bike");
        assert_eq!(note.recipient, "winner@example.com");
        assert_eq!(note.subject, "Congratulations!");
        assert!(note.body.contains("Road bike"));
    }
}
