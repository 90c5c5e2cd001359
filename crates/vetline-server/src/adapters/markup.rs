//! Call-Control Markup Renderer
//!
//! Renders the state machine's provider-neutral instructions into the XML
//! call-control document the telephony provider executes (Play, Say,
//! Record, Redirect, Pause, Hangup verbs). Webhook handlers return this
//! markup synchronously.

use vetline::domain::{Instruction, PromptRef, ResponseWindow};

use crate::config::FlowConfig;

const FALLBACK_VOICE: &str = "Polly.Joanna";

/// Renders instructions against one deployment's webhook base URL and
/// flow timing.
pub struct MarkupRenderer {
    base_url: String,
    flow: FlowConfig,
    instructions_audio: Option<String>,
}

impl MarkupRenderer {
    pub fn new(base_url: String, flow: FlowConfig, instructions_audio: Option<String>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            flow,
            instructions_audio,
        }
    }

    /// Render one instruction into a complete markup document.
    pub fn render(&self, instruction: &Instruction, assessment_id: &str) -> String {
        let mut doc = Document::new();

        match instruction {
            Instruction::Ask {
                prompt,
                include_intro,
                intro_audio,
                window,
            } => {
                if *include_intro {
                    match intro_audio {
                        Some(url) => doc.play(url),
                        None => doc.say("Hello! Welcome to your skills assessment. Let's begin."),
                    }
                    doc.pause(1);
                }
                self.prompt_and_record(&mut doc, prompt, assessment_id, *window);
            }
            Instruction::Replay { prompt, window } => {
                self.prompt_and_record(&mut doc, prompt, assessment_id, *window);
            }
            Instruction::Encourage { prompt } => {
                match &self.instructions_audio {
                    Some(url) => doc.play(url),
                    None => doc.say(
                        "When you have finished your answer, press the pound key. \
                         To hear the question again, press star.",
                    ),
                }
                doc.record(
                    &self.recording_action(assessment_id, &prompt.question_key),
                    self.flow.extended_timeout_secs,
                    self.flow.max_answer_secs,
                );
                self.no_response_tail(&mut doc);
            }
            Instruction::Listen { prompt, window } => {
                doc.record(
                    &self.recording_action(assessment_id, &prompt.question_key),
                    self.window_secs(*window),
                    self.flow.max_answer_secs,
                );
                self.no_response_tail(&mut doc);
            }
            Instruction::Conclude { goodbye_audio } => {
                match goodbye_audio {
                    Some(url) => doc.play(url),
                    None => doc.say(
                        "Thank you for completing the assessment. We will contact you soon. Goodbye.",
                    ),
                }
                doc.hangup();
            }
            Instruction::Apologize { message } => {
                doc.say(message);
                doc.hangup();
            }
            Instruction::Acknowledge => {}
        }

        doc.finish()
    }

    fn window_secs(&self, window: ResponseWindow) -> u32 {
        match window {
            ResponseWindow::Standard => self.flow.response_timeout_secs,
            ResponseWindow::Extended => self.flow.extended_timeout_secs,
        }
    }

    fn prompt_and_record(
        &self,
        doc: &mut Document,
        prompt: &PromptRef,
        assessment_id: &str,
        window: ResponseWindow,
    ) {
        match &prompt.audio_url {
            Some(url) => doc.play(url),
            None => doc.say(&prompt.prompt_text),
        }
        doc.record(
            &self.recording_action(assessment_id, &prompt.question_key),
            self.window_secs(window),
            self.flow.max_answer_secs,
        );
        self.no_response_tail(doc);
    }

    /// Reached only if the provider falls through the Record verb without
    /// posting a callback; the candidate is never left on a silent line.
    fn no_response_tail(&self, doc: &mut Document) {
        doc.say("We didn't receive your response. Thank you for your time. Goodbye.");
        doc.hangup();
    }

    fn recording_action(&self, assessment_id: &str, question_key: &str) -> String {
        format!(
            "{}/webhook/recording?assessment_id={assessment_id}&question={question_key}",
            self.base_url
        )
    }
}

/// Minimal builder for the provider's XML response document.
struct Document {
    body: String,
}

impl Document {
    fn new() -> Self {
        Self {
            body: String::new(),
        }
    }

    fn say(&mut self, text: &str) {
        self.body.push_str(&format!(
            "    <Say voice=\"{FALLBACK_VOICE}\">{}</Say>\n",
            xml_escape(text)
        ));
    }

    fn play(&mut self, url: &str) {
        self.body
            .push_str(&format!("    <Play>{}</Play>\n", xml_escape(url)));
    }

    fn pause(&mut self, seconds: u32) {
        self.body
            .push_str(&format!("    <Pause length=\"{seconds}\"/>\n"));
    }

    fn record(&mut self, action: &str, timeout_secs: u32, max_length_secs: u32) {
        self.body.push_str(&format!(
            "    <Record timeout=\"{timeout_secs}\" maxLength=\"{max_length_secs}\" \
             finishOnKey=\"#*\" transcribe=\"false\" action=\"{}\" method=\"POST\"/>\n",
            xml_escape(action)
        ));
    }

    fn hangup(&mut self) {
        self.body.push_str("    <Hangup/>\n");
    }

    fn finish(self) -> String {
        format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<Response>\n{}</Response>",
            self.body
        )
    }
}

fn xml_escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn renderer() -> MarkupRenderer {
        MarkupRenderer::new(
            "https://api.vetline.test".to_string(),
            FlowConfig::default(),
            Some("https://assets.test/instructions.mp3".to_string()),
        )
    }

    fn prompt() -> PromptRef {
        PromptRef {
            role_key: "bartender".to_string(),
            question_key: "knowledge_margarita".to_string(),
            prompt_text: "What goes into a margarita?".to_string(),
            audio_url: Some("https://assets.test/knowledge_margarita.mp3".to_string()),
        }
    }

    #[test]
    fn test_ask_renders_prompt_and_record() {
        let markup = renderer().render(
            &Instruction::Ask {
                prompt: prompt(),
                include_intro: true,
                intro_audio: Some("https://assets.test/intro.mp3".to_string()),
                window: ResponseWindow::Standard,
            },
            "a1",
        );

        assert!(markup.starts_with("<?xml version=\"1.0\""));
        assert!(markup.contains("<Play>https://assets.test/intro.mp3</Play>"));
        assert!(markup.contains("<Play>https://assets.test/knowledge_margarita.mp3</Play>"));
        assert!(markup.contains("timeout=\"5\""));
        assert!(markup.contains("finishOnKey=\"#*\""));
        // The action URL is escaped for embedding in XML.
        assert!(markup.contains(
            "action=\"https://api.vetline.test/webhook/recording?assessment_id=a1&amp;question=knowledge_margarita\""
        ));
        assert!(markup.ends_with("</Response>"));
    }

    #[test]
    fn test_ask_without_audio_says_prompt_text() {
        let mut p = prompt();
        p.audio_url = None;
        let markup = renderer().render(
            &Instruction::Ask {
                prompt: p,
                include_intro: false,
                intro_audio: None,
                window: ResponseWindow::Standard,
            },
            "a1",
        );
        assert!(markup.contains("What goes into a margarita?"));
        assert!(!markup.contains("<Play>https://assets.test/intro.mp3</Play>"));
    }

    #[test]
    fn test_encourage_opens_extended_window() {
        let markup = renderer().render(&Instruction::Encourage { prompt: prompt() }, "a1");
        assert!(markup.contains("<Play>https://assets.test/instructions.mp3</Play>"));
        assert!(markup.contains("timeout=\"120\""));
    }

    #[test]
    fn test_replay_and_listen_reopen_the_window() {
        let replay = renderer().render(
            &Instruction::Replay {
                prompt: prompt(),
                window: ResponseWindow::Standard,
            },
            "a1",
        );
        assert!(replay.contains("<Play>https://assets.test/knowledge_margarita.mp3</Play>"));
        assert!(replay.contains("<Record"));

        let listen = renderer().render(
            &Instruction::Listen {
                prompt: prompt(),
                window: ResponseWindow::Standard,
            },
            "a1",
        );
        // Listen opens a window without replaying the prompt.
        assert!(!listen.contains("<Play>https://assets.test/knowledge_margarita.mp3</Play>"));
        assert!(listen.contains("question=knowledge_margarita"));
    }

    #[test]
    fn test_conclude_and_apologize_hang_up() {
        let conclude = renderer().render(
            &Instruction::Conclude {
                goodbye_audio: None,
            },
            "a1",
        );
        assert!(conclude.contains("<Hangup/>"));

        let apology = renderer().render(&Instruction::apologize(), "a1");
        assert!(apology.contains("<Say"));
        assert!(apology.contains("<Hangup/>"));
    }

    #[test]
    fn test_acknowledge_is_empty_response() {
        let markup = renderer().render(&Instruction::Acknowledge, "a1");
        assert_eq!(
            markup,
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<Response>\n</Response>"
        );
    }

    #[test]
    fn test_xml_escape() {
        assert_eq!(xml_escape("a&b<c>\"d\""), "a&amp;b&lt;c&gt;&quot;d&quot;");
    }
}
