//! The closed set of sales-message categories.

use serde::{Deserialize, Serialize};
use std::fmt;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Intent of the requested message.
///
/// The wire form is a kebab-case slug; `Greeting` is the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "kebab-case")]
pub enum SalesTag {
    #[default]
    Greeting,
    GroupProspecting,
    ObjectionHandling,
    FollowUp,
    Promotion,
    SalesRecovery,
    Billing,
    Scheduling,
    PostSale,
    SatisfactionSurvey,
    Announcement,
    Thanks,
    EventReminder,
    Other,
}

impl SalesTag {
    /// All tags in display order.
    pub const ALL: [SalesTag; 14] = [
        SalesTag::Greeting,
        SalesTag::GroupProspecting,
        SalesTag::ObjectionHandling,
        SalesTag::FollowUp,
        SalesTag::Promotion,
        SalesTag::SalesRecovery,
        SalesTag::Billing,
        SalesTag::Scheduling,
        SalesTag::PostSale,
        SalesTag::SatisfactionSurvey,
        SalesTag::Announcement,
        SalesTag::Thanks,
        SalesTag::EventReminder,
        SalesTag::Other,
    ];

    pub fn slug(self) -> &'static str {
        match self {
            SalesTag::Greeting => "greeting",
            SalesTag::GroupProspecting => "group-prospecting",
            SalesTag::ObjectionHandling => "objection-handling",
            SalesTag::FollowUp => "follow-up",
            SalesTag::Promotion => "promotion",
            SalesTag::SalesRecovery => "sales-recovery",
            SalesTag::Billing => "billing",
            SalesTag::Scheduling => "scheduling",
            SalesTag::PostSale => "post-sale",
            SalesTag::SatisfactionSurvey => "satisfaction-survey",
            SalesTag::Announcement => "announcement",
            SalesTag::Thanks => "thanks",
            SalesTag::EventReminder => "event-reminder",
            SalesTag::Other => "other",
        }
    }

    /// Name sent to the model and shown without decoration.
    pub fn prompt_name(self) -> &'static str {
        match self {
            SalesTag::Greeting => "Saudação",
            SalesTag::GroupProspecting => "Prospecção em Grupos",
            SalesTag::ObjectionHandling => "Contorno de Objeções",
            SalesTag::FollowUp => "Follow-up",
            SalesTag::Promotion => "Promoção",
            SalesTag::SalesRecovery => "Recuperação de Vendas",
            SalesTag::Billing => "Cobrança",
            SalesTag::Scheduling => "Agendamento",
            SalesTag::PostSale => "Pós-venda",
            SalesTag::SatisfactionSurvey => "Pesquisa de Satisfação",
            SalesTag::Announcement => "Divulgação de Novidades",
            SalesTag::Thanks => "Agradecimento",
            SalesTag::EventReminder => "Lembrete de Evento",
            SalesTag::Other => "Outros",
        }
    }

    fn emoji(self) -> &'static str {
        match self {
            SalesTag::Greeting => "👋",
            SalesTag::GroupProspecting => "👥",
            SalesTag::ObjectionHandling => "🤔",
            SalesTag::FollowUp => "🔄",
            SalesTag::Promotion => "🎉",
            SalesTag::SalesRecovery => "🛒",
            SalesTag::Billing => "💰",
            SalesTag::Scheduling => "📅",
            SalesTag::PostSale => "👍",
            SalesTag::SatisfactionSurvey => "🌟",
            SalesTag::Announcement => "🚀",
            SalesTag::Thanks => "🙏",
            SalesTag::EventReminder => "🔔",
            SalesTag::Other => "💬",
        }
    }

    /// Label for the tag picker, e.g. `👋 Saudação`.
    pub fn label(self) -> String {
        format!("{} {}", self.emoji(), self.prompt_name())
    }
}

impl fmt::Display for SalesTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}
