//! Minimal reader for QSettings-style INI text
//!
//! Keys keep their exact case and backslashes are ordinary key characters,
//! since QjackCtl uses them as group separators (`Studio\Samplerate`).

use tracing::debug;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Section {
    pub name: String,
    entries: Vec<(String, String)>,
}

impl Section {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            entries: Vec::new(),
        }
    }

    /// Later assignments of the same key replace earlier ones in place
    fn insert(&mut self, key: &str, value: &str) {
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value.to_string(),
            None => self.entries.push((key.to_string(), value.to_string())),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Entries in file order
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IniDocument {
    sections: Vec<Section>,
}

impl IniDocument {
    pub fn parse(text: &str) -> Self {
        let mut doc = IniDocument::default();
        let mut current: Option<usize> = None;

        for (lineno, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }

            if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                current = Some(doc.section_index(name.trim()));
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                debug!(line = lineno + 1, "Ignoring INI line without '='");
                continue;
            };

            match current {
                Some(index) => doc.sections[index].insert(key.trim(), value.trim()),
                None => debug!(line = lineno + 1, "Ignoring INI entry outside of any section"),
            }
        }

        doc
    }

    /// Index of the named section, appending it when first seen
    fn section_index(&mut self, name: &str) -> usize {
        match self.sections.iter().position(|s| s.name == name) {
            Some(index) => index,
            None => {
                self.sections.push(Section::new(name));
                self.sections.len() - 1
            }
        }
    }

    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_preserves_key_case_and_backslashes() {
        let doc = IniDocument::parse("[Settings]\nStudio\\SampleRate=48000\nstudio\\samplerate=44100\n");
        let settings = doc.section("Settings").unwrap();
        assert_eq!(settings.get("Studio\\SampleRate"), Some("48000"));
        assert_eq!(settings.get("studio\\samplerate"), Some("44100"));
    }

    #[test]
    fn test_parse_trims_and_skips_comments() {
        let doc = IniDocument::parse("# comment\n; other\n[Presets]\n  1 = Studio  \n\n");
        assert_eq!(doc.section("Presets").unwrap().get("1"), Some("Studio"));
    }

    #[test]
    fn test_value_keeps_colons_and_equals() {
        let doc = IniDocument::parse("[Settings]\nLive\\Interface=hw:USB,0\nLive\\Args=a=b\n");
        let settings = doc.section("Settings").unwrap();
        assert_eq!(settings.get("Live\\Interface"), Some("hw:USB,0"));
        assert_eq!(settings.get("Live\\Args"), Some("a=b"));
    }

    #[test]
    fn test_empty_value() {
        let doc = IniDocument::parse("[Settings]\nLive\\Frames=\n");
        assert_eq!(doc.section("Settings").unwrap().get("Live\\Frames"), Some(""));
    }

    #[test]
    fn test_repeated_sections_merge_and_keys_override() {
        let doc = IniDocument::parse("[Presets]\n1=A\n[Other]\nx=y\n[Presets]\n1=B\n2=C\n");
        let presets = doc.section("Presets").unwrap();
        let entries: Vec<_> = presets.entries().collect();
        assert_eq!(entries, vec![("1", "B"), ("2", "C")]);
    }

    #[test]
    fn test_entries_outside_sections_are_ignored() {
        let doc = IniDocument::parse("orphan=1\n[Presets]\n");
        assert!(doc.section("Presets").unwrap().entries().next().is_none());
        assert!(doc.section("orphan").is_none());
    }
}
