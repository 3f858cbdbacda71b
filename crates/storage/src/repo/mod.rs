mod drafts;
mod identity;
