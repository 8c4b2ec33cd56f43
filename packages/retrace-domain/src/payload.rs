/// Removes Markdown code-fence wrapping from an oracle response.
///
/// The model is instructed to answer with bare JSON but frequently wraps it
/// in ```json fences anyway; the payload is untrusted text either way and
/// still goes through a strict parse afterwards.
pub fn strip_code_fences(raw: &str) -> String {
	raw.replace("```json", "").replace("```", "").trim().to_string()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn strips_json_fences() {
		let raw = "```json\n{\"ok\": true}\n```";
		assert_eq!(strip_code_fences(raw), "{\"ok\": true}");
	}

	#[test]
	fn strips_bare_fences_and_whitespace() {
		let raw = "```\n[1, 2]\n```  ";
		assert_eq!(strip_code_fences(raw), "[1, 2]");
	}

	#[test]
	fn leaves_plain_payloads_alone() {
		assert_eq!(strip_code_fences("{\"a\": 1}"), "{\"a\": 1}");
	}
}
