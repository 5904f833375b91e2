//! Outbound replies.

use {
    teloxide::{
        payloads::SendMessageSetters,
        prelude::*,
        types::{Message, ParseMode, ReplyParameters},
    },
    tracing::warn,
};

use crate::Result;

/// Reply to `msg` with HTML formatting, falling back to plain text when
/// Telegram rejects the parse.
pub async fn reply_html(bot: &Bot, msg: &Message, text: &str) -> Result<()> {
    let request = bot
        .send_message(msg.chat.id, text)
        .parse_mode(ParseMode::Html)
        .reply_parameters(reply_params(msg));
    match request.await {
        Ok(_) => Ok(()),
        Err(e) => {
            warn!(
                chat_id = msg.chat.id.0,
                error = %e,
                "telegram HTML send failed, retrying as plain text"
            );
            reply_plain(bot, msg, text).await
        },
    }
}

/// Reply to `msg` with plain text.
pub async fn reply_plain(bot: &Bot, msg: &Message, text: &str) -> Result<()> {
    bot.send_message(msg.chat.id, text)
        .reply_parameters(reply_params(msg))
        .await?;
    Ok(())
}

fn reply_params(msg: &Message) -> ReplyParameters {
    ReplyParameters::new(msg.id).allow_sending_without_reply()
}
