use regex::Regex;

/// Hero selection reported by the client's hero picker.
pub const HERO_SELECTION: &str = r"sHeroSelection:.*npc_dota_hero_([a-z_]+)";
/// Player resource update naming a player's selected hero.
pub const SET_SELECTED_HERO: &str =
    r"PR:SetSelectedHero\s+\d+:\[U:1:\d+\]\s+npc_dota_hero_([a-z_]+)\(\d+\)";

/// One independent matcher: a line either yields a hero short name or nothing.
#[derive(Debug, Clone)]
pub struct RevealRule {
    name: &'static str,
    pattern: Regex,
}

impl RevealRule {
    pub fn new(name: &'static str, pattern: &str) -> Result<Self, regex::Error> {
        Ok(RevealRule {
            name,
            pattern: Regex::new(pattern)?,
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn extract(&self, line: &str) -> Option<String> {
        self.pattern
            .captures(line)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reveal {
    pub rule: &'static str,
    pub hero: String,
}

/// Ordered rule list; the first rule that matches a line wins.
#[derive(Debug, Clone)]
pub struct HeroRevealMatcher {
    rules: Vec<RevealRule>,
}

impl HeroRevealMatcher {
    pub fn new(rules: Vec<RevealRule>) -> Self {
        HeroRevealMatcher { rules }
    }

    pub fn standard() -> Result<Self, regex::Error> {
        Ok(HeroRevealMatcher::new(vec![
            RevealRule::new("hero_selection", HERO_SELECTION)?,
            RevealRule::new("set_selected_hero", SET_SELECTED_HERO)?,
        ]))
    }

    pub fn first_match(&self, line: &str) -> Option<Reveal> {
        self.rules.iter().find_map(|rule| {
            rule.extract(line).map(|hero| Reveal {
                rule: rule.name(),
                hero,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_from_hero_selection_line() {
        let matcher = HeroRevealMatcher::standard().unwrap();
        let reveal = matcher
            .first_match("[Client] sHeroSelection: player 3 -> npc_dota_hero_crystal_maiden")
            .unwrap();
        assert_eq!(reveal.rule, "hero_selection");
        assert_eq!(reveal.hero, "crystal_maiden");
    }

    #[test]
    fn extracts_from_set_selected_hero_line() {
        let matcher = HeroRevealMatcher::standard().unwrap();
        let reveal = matcher
            .first_match("PR:SetSelectedHero 7:[U:1:123456789] npc_dota_hero_phantom_lancer(12)")
            .unwrap();
        assert_eq!(reveal.rule, "set_selected_hero");
        assert_eq!(reveal.hero, "phantom_lancer");
    }

    #[test]
    fn earlier_rule_wins_when_both_match() {
        let matcher = HeroRevealMatcher::new(vec![
            RevealRule::new("first", r"hero=([a-z_]+)").unwrap(),
            RevealRule::new("second", r"([a-z_]+)=hero").unwrap(),
        ]);
        let reveal = matcher.first_match("hero=axe pudge=hero").unwrap();
        assert_eq!(reveal.rule, "first");
        assert_eq!(reveal.hero, "axe");
    }

    #[test]
    fn unrelated_lines_do_not_match() {
        let matcher = HeroRevealMatcher::standard().unwrap();
        assert_eq!(matcher.first_match("Steam Net connected"), None);
        assert_eq!(matcher.first_match(""), None);
    }
}
