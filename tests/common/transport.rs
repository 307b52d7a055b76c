#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use techinterview::core::AppResult;
use techinterview::telegram::{BotIdentity, BotTransport, InlineArticle, TelegramBotReplyData};

#[derive(Debug, Clone, PartialEq)]
pub struct SentReply {
    pub chat_id: i64,
    pub reply: TelegramBotReplyData,
    pub reply_to: Option<i32>,
}

/// Records every outbound call instead of talking to Telegram.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    username: Option<String>,
    identity_calls: AtomicUsize,
    replies: Mutex<Vec<SentReply>>,
    inline_answers: Mutex<Vec<(String, Vec<InlineArticle>)>>,
}

impl RecordingTransport {
    pub fn with_username(username: &str) -> Self {
        Self {
            username: Some(username.to_string()),
            ..Self::default()
        }
    }

    pub fn replies(&self) -> Vec<SentReply> {
        self.replies.lock().unwrap().clone()
    }

    pub fn inline_answers(&self) -> Vec<(String, Vec<InlineArticle>)> {
        self.inline_answers.lock().unwrap().clone()
    }

    pub fn identity_calls(&self) -> usize {
        self.identity_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BotTransport for RecordingTransport {
    async fn bot_identity(&self) -> AppResult<BotIdentity> {
        self.identity_calls.fetch_add(1, Ordering::SeqCst);
        Ok(BotIdentity {
            username: self.username.clone(),
        })
    }

    async fn send_reply(&self, chat_id: i64, reply: &TelegramBotReplyData, reply_to: Option<i32>) -> AppResult<()> {
        self.replies.lock().unwrap().push(SentReply {
            chat_id,
            reply: reply.clone(),
            reply_to,
        });
        Ok(())
    }

    async fn answer_inline(&self, query_id: &str, articles: Vec<InlineArticle>) -> AppResult<()> {
        self.inline_answers
            .lock()
            .unwrap()
            .push((query_id.to_string(), articles));
        Ok(())
    }
}
