//! TwiML call-control markup

use axum::{
    http::header,
    response::{IntoResponse, Response},
};

/// Seconds the provider waits for the bridged leg to answer
pub const DIAL_TIMEOUT_SECS: u32 = 30;

#[derive(Debug, Clone, PartialEq)]
pub enum DialTarget {
    Number(String),
    Client(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dial {
    pub target: DialTarget,
    pub caller_id: Option<String>,
    pub timeout: u32,
    pub answer_on_bridge: bool,
}

#[derive(Debug, Clone, PartialEq)]
enum Verb {
    Say(String),
    Dial(Dial),
}

/// A `<Response>` document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VoiceResponse {
    verbs: Vec<Verb>,
}

impl VoiceResponse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn say(mut self, text: impl Into<String>) -> Self {
        self.verbs.push(Verb::Say(text.into()));
        self
    }

    pub fn dial(mut self, dial: Dial) -> Self {
        self.verbs.push(Verb::Dial(dial));
        self
    }

    pub fn to_xml(&self) -> String {
        let mut xml = String::from(r#"<?xml version="1.0" encoding="UTF-8"?><Response>"#);

        for verb in &self.verbs {
            match verb {
                Verb::Say(text) => {
                    xml.push_str(&format!("<Say>{}</Say>", escape_xml(text)));
                }
                Verb::Dial(dial) => {
                    xml.push_str("<Dial");
                    if let Some(caller_id) = &dial.caller_id {
                        xml.push_str(&format!(r#" callerId="{}""#, escape_xml(caller_id)));
                    }
                    xml.push_str(&format!(r#" timeout="{}""#, dial.timeout));
                    if dial.answer_on_bridge {
                        xml.push_str(r#" answerOnBridge="true""#);
                    }
                    xml.push('>');
                    match &dial.target {
                        DialTarget::Number(n) => xml.push_str(&format!("<Number>{}</Number>", escape_xml(n))),
                        DialTarget::Client(c) => xml.push_str(&format!("<Client>{}</Client>", escape_xml(c))),
                    }
                    xml.push_str("</Dial>");
                }
            }
        }

        xml.push_str("</Response>");
        xml
    }
}

impl IntoResponse for VoiceResponse {
    fn into_response(self) -> Response {
        ([(header::CONTENT_TYPE, "text/xml")], self.to_xml()).into_response()
    }
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
