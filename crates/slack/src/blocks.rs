use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum TextObject {
    #[serde(rename = "plain_text")]
    Plain { text: String },
    #[serde(rename = "mrkdwn")]
    Mrkdwn { text: String },
}

impl TextObject {
    pub fn plain(text: impl Into<String>) -> Self {
        Self::Plain { text: text.into() }
    }

    pub fn mrkdwn(text: impl Into<String>) -> Self {
        Self::Mrkdwn { text: text.into() }
    }
}

/// Link button. Both replica messages only ever link out, so the element
/// carries a url rather than an interactive value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ButtonElement {
    #[serde(rename = "type")]
    pub element_type: &'static str,
    pub action_id: String,
    pub text: TextObject,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl ButtonElement {
    pub fn new(action_id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            element_type: "button",
            action_id: action_id.into(),
            text: TextObject::plain(label),
            url: None,
        }
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

/// One selectable entry in a static select (dashboard id + display title).
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SelectOption {
    pub text: TextObject,
    pub value: String,
}

impl SelectOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self { text: TextObject::plain(label), value: value.into() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StaticSelectElement {
    pub action_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<TextObject>,
    pub options: Vec<SelectOption>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputElement {
    StaticSelect(StaticSelectElement),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Section {
        block_id: String,
        text: TextObject,
    },
    Actions {
        block_id: String,
        elements: Vec<ButtonElement>,
    },
    Input {
        block_id: String,
        label: TextObject,
        #[serde(skip_serializing_if = "Option::is_none")]
        hint: Option<TextObject>,
        element: InputElement,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MessageTemplate {
    pub fallback_text: String,
    pub blocks: Vec<Block>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ModalView {
    #[serde(rename = "type")]
    pub view_type: &'static str,
    pub callback_id: String,
    pub title: TextObject,
    pub submit: TextObject,
    pub close: TextObject,
    pub blocks: Vec<Block>,
}

pub struct MessageBuilder {
    fallback_text: String,
    blocks: Vec<Block>,
}

impl MessageBuilder {
    pub fn new(fallback_text: impl Into<String>) -> Self {
        Self { fallback_text: fallback_text.into(), blocks: Vec::new() }
    }

    pub fn section<F>(mut self, block_id: impl Into<String>, build: F) -> Self
    where
        F: FnOnce(&mut SectionBuilder),
    {
        let mut builder = SectionBuilder::default();
        build(&mut builder);
        self.blocks.push(Block::Section { block_id: block_id.into(), text: builder.build() });
        self
    }

    pub fn actions<F>(mut self, block_id: impl Into<String>, build: F) -> Self
    where
        F: FnOnce(&mut ActionsBuilder),
    {
        let mut builder = ActionsBuilder::default();
        build(&mut builder);
        self.blocks.push(Block::Actions { block_id: block_id.into(), elements: builder.build() });
        self
    }

    pub fn build(self) -> MessageTemplate {
        MessageTemplate { fallback_text: self.fallback_text, blocks: self.blocks }
    }
}

#[derive(Default)]
pub struct SectionBuilder {
    text: Option<TextObject>,
}

impl SectionBuilder {
    pub fn plain(&mut self, text: impl Into<String>) -> &mut Self {
        self.text = Some(TextObject::plain(text));
        self
    }

    pub fn mrkdwn(&mut self, text: impl Into<String>) -> &mut Self {
        self.text = Some(TextObject::mrkdwn(text));
        self
    }

    fn build(self) -> TextObject {
        self.text.unwrap_or_else(|| TextObject::plain(""))
    }
}

#[derive(Default)]
pub struct ActionsBuilder {
    elements: Vec<ButtonElement>,
}

impl ActionsBuilder {
    pub fn button(&mut self, button: ButtonElement) -> &mut Self {
        self.elements.push(button);
        self
    }

    fn build(self) -> Vec<ButtonElement> {
        self.elements
    }
}

pub const PICKER_BLOCK_ID: &str = "dashboard_select_block";
pub const PICKER_ACTION_ID: &str = "dashboard_select_action";

/// Selection dialog: description plus a dashboard dropdown. The caller caps
/// `options` before rendering; this function only lays out blocks.
pub fn dashboard_picker_modal(view_callback_id: &str, options: Vec<SelectOption>) -> ModalView {
    ModalView {
        view_type: "modal",
        callback_id: view_callback_id.to_string(),
        title: TextObject::plain("Create a Replica"),
        submit: TextObject::plain("Create"),
        close: TextObject::plain("Cancel"),
        blocks: vec![
            Block::Section {
                block_id: "replica.picker.description.v1".to_string(),
                text: TextObject::mrkdwn(
                    "Please choose a Datadog dashboard from the dropdown below that you wish to \
                     replicate. Once you've made your selection, click 'Create' to generate a \
                     unique replica link.",
                ),
            },
            Block::Input {
                block_id: PICKER_BLOCK_ID.to_string(),
                label: TextObject::plain("Select a Dashboard"),
                hint: Some(TextObject::plain(
                    "Ensure you select the correct dashboard from the list",
                )),
                element: InputElement::StaticSelect(StaticSelectElement {
                    action_id: PICKER_ACTION_ID.to_string(),
                    placeholder: None,
                    options,
                }),
            },
        ],
    }
}

pub fn replica_ready_message(
    selected_title: &str,
    user_id: &str,
    replica_name: &str,
    replica_url: &str,
    review_url: &str,
) -> MessageTemplate {
    MessageBuilder::new(format!("Replica `{replica_name}` of {selected_title} is ready"))
        .section("replica.ready.selected.v1", |section| {
            section.mrkdwn(format!("<@{user_id}>\n\nSelected dashboard: *{selected_title}*"));
        })
        .section("replica.ready.name.v1", |section| {
            section.mrkdwn(format!("Generated replica name: *{replica_name}*"));
        })
        .actions("replica.ready.actions.v1", |actions| {
            actions
                .button(ButtonElement::new("replica.open.v1", "Open Replica").url(replica_url))
                .button(ButtonElement::new("replica.merge.v1", "Merge Changes").url(review_url));
        })
        .build()
}

pub fn greeting_message(user_id: &str) -> MessageTemplate {
    MessageBuilder::new(format!(":wave: Hi there, <@{user_id}>!"))
        .section("replica.greeting.v1", |section| {
            section.mrkdwn(format!(":wave: Hi there, <@{user_id}>!"));
        })
        .build()
}
