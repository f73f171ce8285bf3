//! Literal label sets for every user-visible string.
//!
//! The dashboard ships Turkish (the default) and English labels. There is
//! no pluralisation or formatting logic beyond string concatenation.

use crate::config::Locale;
use crate::countdown::Remaining;

/// All user-visible strings for one locale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Labels {
    /// Trigger text while no fetch is in flight.
    pub fetch_idle: &'static str,
    /// Trigger text while a fetch is in flight.
    pub fetch_loading: &'static str,
    /// Prefix shown in the result area when a request fails outright.
    pub fetch_failed: &'static str,
    /// Countdown unit for days.
    pub days: &'static str,
    /// Countdown unit for hours.
    pub hours: &'static str,
    /// Countdown unit for minutes.
    pub minutes: &'static str,
    /// Countdown unit for seconds.
    pub seconds: &'static str,
    /// Fixed timer text once the predicted time has passed.
    pub expired: &'static str,
    /// Timer and table text when the server has no prediction.
    pub no_prediction: &'static str,
    /// Summary table column headings.
    pub summary_headings: [&'static str; 2],
    /// Summary table row labels, in display order.
    pub summary_rows: SummaryRowLabels,
    /// Closest-cities table column headings.
    pub city_headings: [&'static str; 4],
    /// Page title.
    pub title: &'static str,
    /// Caption above the countdown.
    pub countdown_caption: &'static str,
}

/// Row labels of the summary table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryRowLabels {
    /// Average magnitude row.
    pub average_magnitude: &'static str,
    /// Next earthquake row.
    pub next_earthquake: &'static str,
    /// Depth row.
    pub depth: &'static str,
    /// Location row.
    pub location: &'static str,
    /// Magnitude row.
    pub magnitude: &'static str,
    /// Recent earthquake count row.
    pub recent_count: &'static str,
    /// Last update row.
    pub last_update: &'static str,
    /// Today's date row.
    pub today: &'static str,
}

/// Turkish labels.
pub static TR: Labels = Labels {
    fetch_idle: "Verileri Getir",
    fetch_loading: "Yükleniyor",
    fetch_failed: "Veri alınamadı",
    days: "gün",
    hours: "saat",
    minutes: "dakika",
    seconds: "saniye",
    expired: "Deprem zamanı geçti.",
    no_prediction: "Tahmin yapılamadı",
    summary_headings: ["Veri", "Değer"],
    summary_rows: SummaryRowLabels {
        average_magnitude: "Ortalama Büyüklük (Mag)",
        next_earthquake: "Bir Sonraki Deprem",
        depth: "Derinlik (km)",
        location: "Depremin Yeri",
        magnitude: "Büyüklük (Mag)",
        recent_count: "Son Aktif Deprem Sayısı",
        last_update: "Son Güncelleme",
        today: "Bugün Tarihi",
    },
    city_headings: ["Şehir", "Plaka", "Mesafe", "Nüfus"],
    title: "Deprem Tahmini",
    countdown_caption: "Bir sonraki depreme kalan süre",
};

/// English labels.
pub static EN: Labels = Labels {
    fetch_idle: "Fetch Data",
    fetch_loading: "Loading",
    fetch_failed: "Could not fetch data",
    days: "days",
    hours: "hours",
    minutes: "minutes",
    seconds: "seconds",
    expired: "The earthquake time has passed.",
    no_prediction: "No prediction available",
    summary_headings: ["Field", "Value"],
    summary_rows: SummaryRowLabels {
        average_magnitude: "Average Magnitude (Mag)",
        next_earthquake: "Next Earthquake",
        depth: "Depth (km)",
        location: "Location",
        magnitude: "Magnitude (Mag)",
        recent_count: "Recent Earthquake Count",
        last_update: "Last Update",
        today: "Today",
    },
    city_headings: ["City", "Code", "Distance", "Population"],
    title: "Earthquake Forecast",
    countdown_caption: "Time until the next earthquake",
};

impl Labels {
    /// Label set for a locale.
    pub const fn for_locale(locale: Locale) -> &'static Self {
        match locale {
            Locale::En => &EN,
            Locale::Tr => &TR,
        }
    }

    /// Countdown label, e.g. `1 gün 2 saat 3 dakika 4 saniye`.
    pub fn countdown(&self, remaining: &Remaining) -> String {
        format!(
            "{} {} {} {} {} {} {} {}",
            remaining.days,
            self.days,
            remaining.hours,
            self.hours,
            remaining.minutes,
            self.minutes,
            remaining.seconds,
            self.seconds,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn turkish_countdown_label() {
        let remaining = Remaining {
            days: 1,
            hours: 2,
            minutes: 3,
            seconds: 4,
        };
        assert_eq!(TR.countdown(&remaining), "1 gün 2 saat 3 dakika 4 saniye");
    }

    #[test]
    fn locale_selects_label_set() {
        assert_eq!(Labels::for_locale(Locale::En).fetch_idle, "Fetch Data");
        assert_eq!(Labels::for_locale(Locale::Tr).fetch_loading, "Yükleniyor");
    }
}
