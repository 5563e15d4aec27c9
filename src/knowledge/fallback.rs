// Copyright 2026 Muvon Un Limited
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::knowledge::types::Snapshot;

const HOME: &str = "MPTI Technical Institute - Leading Technical Education in Ghana

MPTI Technical Institute is a premier institution offering technical and vocational education programs.
Programs: Technical Education, Engineering Technology, Professional Certifications, TACT Program
Website: https://www.mptigh.com/
Contact: Visit our website for current contact information and application details.";

const PROGRAMS: &str = "MPTI Programs and Courses

Technical Education Programs:
- Engineering Technology
- Information Technology
- Business and Management
- Professional Certifications
- TACT (Technical Advancement and Certification Training)

For detailed program information, admission requirements, and applications, visit https://www.mptigh.com/";

const ADMISSIONS: &str = "MPTI Admissions Information

Admission Requirements:
- Completed application form
- Academic transcripts
- Relevant certificates

Application Process:
1. Visit https://www.mptigh.com/ for current application forms
2. Submit required documents
3. Await admission decision

For specific admission requirements and deadlines, please visit our website or contact the admissions office.";

/// Built-in knowledge used when nothing has ever been scraped
pub fn fallback_snapshot() -> Snapshot {
    [("home", HOME), ("programs", PROGRAMS), ("admissions", ADMISSIONS)]
        .into_iter()
        .map(|(id, text)| (id.to_string(), text.to_string()))
        .collect()
}
