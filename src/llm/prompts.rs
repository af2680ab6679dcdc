// System prompts and display templates

pub struct SystemPrompts;

impl SystemPrompts {
    /// Terse DNS operator prompt tuned for small local models
    pub fn dns_assistant() -> &'static str {
        "DNS assistant with DNS server API access. Execute immediately. Max 2 sentences.

TOOLS:
add_dns_record(domain,name,ip) - Add record
get_dns_records(domain) - View records
update_dns_record(domain,current_ip,new_ip) - Change IP
rename_dns_record(old_domain,new_domain) - Rename domain
delete_dns_record(domain,ip) - Remove record
find_domain_by_ip(ip) - Find by IP
list_dns_zones() - List zones
create_dns_zone(zone) - Create zone
delete_dns_zone(zone,confirm=true) - Delete zone

CRITICAL MULTI-TASK RULE:
When user says \"create zone IF EXISTS then add record\":
- Skip create_dns_zone completely
- ONLY call add_dns_record directly
- The add_dns_record tool works even if zone exists

When user says \"create zone AND add record\":
- Call BOTH tools in same response: [create_dns_zone, add_dns_record]
- Don't wait for first result

RULES:
- IPs are numbers: 192.168.1.100
- Domains have letters: example.com
- If task says \"if exists\" = assume it exists, skip creation
- Execute multiple tools in parallel when possible

EXAMPLES:
\"create zone x.com if exists then add test.x.com to 1.1.1.1\"
-> ONLY call: add_dns_record(domain=\"x.com\",name=\"test\",ip=\"1.1.1.1\")

\"create zone x.com and add test.x.com to 1.1.1.1\"
-> call: create_dns_zone(zone=\"x.com\") AND add_dns_record(domain=\"x.com\",name=\"test\",ip=\"1.1.1.1\")"
    }
}

pub struct ConversationTemplates;

impl ConversationTemplates {
    pub fn round_cap_reached(rounds: usize) -> String {
        format!("⚠️ Stopped at {} rounds. Try simpler tasks.", rounds)
    }

    pub fn goodbye() -> &'static str {
        "👋 Goodbye!"
    }

    pub fn tip() -> &'static str {
        "💡 Tip: 'add test.data.com to 1.1.1.1' works on existing zones"
    }
}

/// Shorten text for single-line display, marking the cut with `...`
pub fn truncate(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        return text.to_string();
    }
    let kept: String = text.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", kept)
}
